/// Bare verbs accepted in place of their `!` directive
pub const COMMAND_ALIASES: &[(&str, &str)] = &[
    ("help", "!help"),
    ("init", "!init"),
    ("new", "!init"),
    ("make", "!init"),
    ("setup", "!init"),
    ("run", "!run"),
    ("execute", "!run"),
    ("list", "!list"),
    ("dir", "!dir"),
    ("ls", "!dir"),
    ("read", "!read"),
    ("cat", "!read"),
    ("show", "!read"),
    ("view", "!read"),
    ("create", "!create"),
    ("write", "!create"),
    ("touch", "!create"),
    ("delete", "!delete"),
    ("rm", "!delete"),
    ("remove", "!delete"),
    ("deleteall", "!deleteall"),
    ("clean", "!deleteall"),
    ("purge", "!deleteall"),
    ("history", "!history"),
    ("info", "!info"),
    ("system", "!info"),
];

pub fn lookup(verb: &str) -> Option<&'static str> {
    COMMAND_ALIASES
        .iter()
        .find(|(alias, _)| *alias == verb)
        .map(|(_, directive)| *directive)
}

/// Replace a leading alias with its directive. Everything after the first
/// token is kept byte for byte.
pub fn resolve(input: &str) -> String {
    let trimmed = input.trim_start();
    let token_end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let (first, rest) = trimmed.split_at(token_end);

    if first.is_empty() {
        return input.to_string();
    }

    match lookup(&first.to_lowercase()) {
        Some(directive) => format!("{}{}", directive, rest),
        None => input.to_string(),
    }
}
