//! Builds the per-execution `VarTable`: the triggering event's attributes
//! plus each of the task's `vars` entries, expanded in declaration order
//! with the already-expanded entries visible to later ones.

use jobwarden_template::Value;
use std::collections::HashMap;

pub fn build(event_vars: &HashMap<String, Value>, task_vars: &[(String, String)]) -> HashMap<String, Value> {
    let mut table = event_vars.clone();
    for (key, template) in task_vars {
        let expanded = jobwarden_template::evaluate_or_original(template, &table);
        table.insert(key.clone(), Value::Str(expanded));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_entries_see_earlier_expanded_values() {
        let event_vars = HashMap::from([("name".to_string(), Value::Str("world".to_string()))]);
        let task_vars = vec![
            ("greeting".to_string(), "hello {{ name }}".to_string()),
            ("shout".to_string(), "{{ greeting }}!".to_string()),
        ];

        let table = build(&event_vars, &task_vars);
        assert_eq!(table.get("greeting"), Some(&Value::Str("hello world".to_string())));
        assert_eq!(table.get("shout"), Some(&Value::Str("hello world!".to_string())));
    }

    #[test]
    fn an_unknown_key_falls_back_to_the_raw_template() {
        let table = build(&HashMap::new(), &[("x".to_string(), "{{ missing }}".to_string())]);
        assert_eq!(table.get("x"), Some(&Value::Str("{{ missing }}".to_string())));
    }
}
