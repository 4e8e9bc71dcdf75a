// src/common/i18n.rs

use std::{collections::HashMap, sync::Arc};

const FALLBACK_LANG: &str = "en";

// (chave, inglês, português)
const MESSAGES: &[(&str, &str, &str)] = &[
    ("error.invalid_token", "Unauthorized User", "Usuário não autenticado"),
    ("error.unauthorized", "Unauthorized User", "Usuário não autorizado"),
    ("error.missing_fields", "Missing required fields", "Campos obrigatórios ausentes"),
    ("error.validation", "Missing required fields", "Um ou mais campos são inválidos."),
    ("error.not_found", "Resource not found", "Recurso não encontrado"),
    (
        "error.external_service",
        "An external service failed. Please try back later.",
        "Um serviço externo falhou. Tente novamente mais tarde.",
    ),
    ("error.blocked_action", "Action not permitted", "Ação não permitida"),
    (
        "error.default_server",
        "Unknown server error. Please try back later.",
        "Ocorreu um erro inesperado. Tente novamente mais tarde.",
    ),
];

/// Tabela de mensagens por idioma. Barata de clonar.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: Arc<HashMap<&'static str, HashMap<&'static str, &'static str>>>,
}

impl I18nStore {
    pub fn load() -> Self {
        let mut messages: HashMap<&'static str, HashMap<&'static str, &'static str>> = HashMap::new();
        for &(key, en, pt) in MESSAGES {
            messages.entry("en").or_default().insert(key, en);
            messages.entry("pt").or_default().insert(key, pt);
        }
        Self {
            messages: Arc::new(messages),
        }
    }

    /// Traduz `key` para `lang`, caindo para inglês e, por fim, para a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.messages
            .get(lang)
            .and_then(|table| table.get(key))
            .or_else(|| {
                self.messages
                    .get(FALLBACK_LANG)
                    .and_then(|table| table.get(key))
            })
            .map(|msg| msg.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::load()
    }
}
