// SPDX-License-Identifier: PMPL-1.0-or-later

//! Script delivery format (Jed-style JSON)
//!
//! ```json
//! {
//!   "domain": "app",
//!   "locale_data": {
//!     "app": {
//!       "": { "domain": "app", "lang": "lv_LV", "plural_forms": "nplurals=3; ..." },
//!       "menu\u0004File": ["Fails"]
//!     }
//!   }
//! }
//! ```

use super::{catalog_forms, context_key};
use crate::plural::plural_rule;
use crate::types::TranslationSet;
use serde_json::{json, Map, Value};

/// Encode the translated, enabled entries of `set`.
pub fn encode(set: &TranslationSet) -> Value {
    let rule = plural_rule(&set.locale);

    let mut messages = Map::new();
    messages.insert(
        String::new(),
        json!({
            "domain": set.domain,
            "lang": set.locale,
            "plural_forms": rule.header(),
        }),
    );
    for translation in set.iter() {
        if translation.disabled || translation.translation.is_empty() {
            continue;
        }
        messages.insert(
            context_key(&translation.context, &translation.original),
            json!(catalog_forms(translation, rule.nplurals)),
        );
    }

    let mut locale_data = Map::new();
    locale_data.insert(set.domain.clone(), Value::Object(messages));
    json!({
        "domain": set.domain,
        "locale_data": locale_data,
    })
}

/// `callback(json);` followed by a newline
pub fn wrap_jsonp(callback: &str, value: &Value) -> String {
    format!("{}({});\n", callback, value)
}
