use std::collections::HashMap;

/// Default title/body templates used when the configuration leaves either
/// `title_template`/`body_template` unset.
pub const DEFAULT_TITLE_TEMPLATE: &str = "{host}: {check} is {state}";
pub const DEFAULT_BODY_TEMPLATE: &str = "{host}/{check} changed from {previous_state} to {state}: {output}";

/// Renders a `{token}` template against `vars`, parsed once at configuration
/// load and reused for every alert. Unknown tokens are left verbatim rather
/// than erroring — a typo in a template shouldn't drop an alert on the floor.
pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let bytes = template.as_bytes();

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = template[i + 1..].find('}') {
                let key = &template[i + 1..i + 1 + end];
                match vars.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                i += end + 2;
                continue;
            }
        }
        let ch = template[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_tokens() {
        let mut vars = HashMap::new();
        vars.insert("host", "web-01".to_string());
        vars.insert("state", "CRITICAL".to_string());
        assert_eq!(render("{host} is {state}", &vars), "web-01 is CRITICAL");
    }

    #[test]
    fn leaves_unknown_tokens_verbatim() {
        let vars = HashMap::new();
        assert_eq!(render("{mystery}", &vars), "{mystery}");
    }

    #[test]
    fn unterminated_brace_is_passed_through() {
        let vars = HashMap::new();
        assert_eq!(render("a {unterminated", &vars), "a {unterminated");
    }
}
