// src/common/i18n.rs

use std::{collections::HashMap, sync::Arc};

const DEFAULT_LANG: &str = "es";

const ES: &[(&str, &str)] = &[
    ("validation_error", "Datos inválidos"),
    ("unauthorized", "API Key inválida o landing inactiva"),
    ("internal_error", "Error interno del servidor"),
    ("not_found.lead", "Lead no encontrado"),
    ("not_found.landing", "Landing no encontrada"),
    ("not_found.expense", "Gasto no encontrado"),
    ("missing_sale_amount", "Se requiere el importe de venta para cerrar como ganado"),
    ("value_required", "Se requiere un valor para esta acción"),
    ("invalid_state", "Estado inválido"),
    ("invalid_priority", "Prioridad inválida"),
    ("invalid_source", "Fuente inválida"),
    ("invalid_activity_kind", "Tipo de actividad inválido"),
    ("landing_slug_taken", "Ya existe una landing con ese slug"),
    ("api_key_collision", "No se pudo generar una API Key única, inténtalo de nuevo"),
    ("invalid_bulk_action", "Acción masiva no reconocida"),
    ("invalid_sort", "Ordenación inválida"),
];

const EN: &[(&str, &str)] = &[
    ("validation_error", "Invalid data"),
    ("unauthorized", "Invalid API key or inactive landing"),
    ("internal_error", "Internal server error"),
    ("not_found.lead", "Lead not found"),
    ("not_found.landing", "Landing not found"),
    ("not_found.expense", "Expense not found"),
    ("missing_sale_amount", "A sale amount is required to close the lead as won"),
    ("value_required", "This action requires a value"),
    ("invalid_state", "Invalid state"),
    ("invalid_priority", "Invalid priority"),
    ("invalid_source", "Invalid source"),
    ("invalid_activity_kind", "Invalid activity type"),
    ("landing_slug_taken", "A landing with that slug already exists"),
    ("api_key_collision", "Could not generate a unique API key, please retry"),
    ("invalid_bulk_action", "Unknown bulk action"),
    ("invalid_sort", "Invalid sort order"),
];

/// Catálogo de mensagens por idioma. Idioma desconhecido cai no espanhol.
#[derive(Clone)]
pub struct I18nStore {
    catalogs: Arc<HashMap<&'static str, HashMap<&'static str, &'static str>>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert("es", ES.iter().copied().collect());
        catalogs.insert("en", EN.iter().copied().collect());
        Self {
            catalogs: Arc::new(catalogs),
        }
    }

    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.lookup(lang, key)
            .or_else(|| self.lookup(DEFAULT_LANG, key))
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&'static str> {
        self.catalogs.get(lang).and_then(|c| c.get(key)).copied()
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_known_language() {
        let store = I18nStore::new();
        assert_eq!(store.translate("en", "not_found.lead"), "Lead not found");
    }

    #[test]
    fn unknown_language_falls_back_to_spanish() {
        let store = I18nStore::new();
        assert_eq!(store.translate("de", "invalid_state"), "Estado inválido");
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::new();
        assert_eq!(store.translate("es", "something_else"), "something_else");
    }

    #[test]
    fn catalogs_have_the_same_keys() {
        let es: Vec<_> = ES.iter().map(|(k, _)| *k).collect();
        let en: Vec<_> = EN.iter().map(|(k, _)| *k).collect();
        assert_eq!(es, en);
    }
}
