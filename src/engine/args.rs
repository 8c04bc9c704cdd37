/// Split a command string into arguments
///
/// Whitespace separates arguments unless it is inside single or double
/// quotes. The quote characters themselves are dropped, so `"[v_out]"`
/// becomes `[v_out]` and `""` becomes an empty argument.
pub fn parse_arguments(command: &str) -> Vec<String> {
    let mut arguments = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in command.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    arguments.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_token {
        arguments.push(current);
    }

    arguments
}

/// Quote an argument for the single-string command form
pub fn quote_argument(argument: &str) -> String {
    format!("\"{}\"", argument)
}
