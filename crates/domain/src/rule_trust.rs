const SCRIPT_RULE_MARKER: &str = "#%#";
const OPTIONS_DELIMITER: char = '$';
const REPLACE_OPTION: &str = "replace=";

/// Untrusted filters may not inject scripts or rewrite response bodies.
pub fn is_trusted_rule(rule: &str) -> bool {
    if rule.contains(SCRIPT_RULE_MARKER) {
        return false;
    }

    if let Some(options_idx) = rule.find(OPTIONS_DELIMITER) {
        if let Some(replace_idx) = rule.find(REPLACE_OPTION) {
            if replace_idx > options_idx {
                return false;
            }
        }
    }

    true
}
