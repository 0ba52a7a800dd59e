//! Target database dialects.
//!
//! A [`DbType`] wraps identifiers and rewrites a base statement into its
//! paginated form. Both operations are pure functions of the declared
//! dialect; there is no autodetection and no shared state.

/// Supported database dialects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbType {
    Mysql,
    MariaDb,
    Postgres,
    Sqlite,
    H2,
    Oracle,
    SqlServer,
}

impl DbType {
    /// Quote an identifier for this dialect.
    ///
    /// Lower-case snake identifiers (`[a-z_][a-z0-9_]*`) need no quoting on
    /// any supported dialect and stay bare. Mixed-case identifiers get the
    /// dialect's quote characters. Idempotent: an already-quoted
    /// identifier, or anything that is not a plain identifier
    /// (expressions, dotted paths, `*`), passes through unchanged.
    pub fn wrap(&self, ident: &str) -> String {
        if is_bare_safe(ident) || !is_plain_identifier(ident) {
            return ident.to_string();
        }
        let (open, close) = self.quote_pair();
        let mut out = String::with_capacity(ident.len() + 2);
        out.push(open);
        out.push_str(ident);
        out.push(close);
        out
    }

    fn quote_pair(&self) -> (char, char) {
        match self {
            DbType::Mysql | DbType::MariaDb => ('`', '`'),
            DbType::Postgres | DbType::Sqlite | DbType::H2 | DbType::Oracle => ('"', '"'),
            DbType::SqlServer => ('[', ']'),
        }
    }

    /// Rewrite `base` into its paginated form.
    pub fn paginate(&self, base: &str, offset: usize, limit: usize) -> String {
        match self {
            DbType::Mysql | DbType::MariaDb | DbType::H2 => {
                if offset == 0 {
                    format!("{base} LIMIT {limit}")
                } else {
                    format!("{base} LIMIT {offset}, {limit}")
                }
            }
            DbType::Postgres | DbType::Sqlite => {
                if offset == 0 {
                    format!("{base} LIMIT {limit}")
                } else {
                    format!("{base} LIMIT {limit} OFFSET {offset}")
                }
            }
            DbType::Oracle => format!(
                "SELECT * FROM (SELECT TMP.*, ROWNUM ROW_ID FROM ({base}) TMP WHERE ROWNUM <= {}) WHERE ROW_ID > {offset}",
                offset + limit
            ),
            DbType::SqlServer => format!(
                "{base} OFFSET {offset} ROWS FETCH NEXT {limit} ROWS ONLY"
            ),
        }
    }

    /// Whether this dialect accepts `LIMIT n` on UPDATE statements.
    pub fn supports_limited_update(&self) -> bool {
        matches!(self, DbType::Mysql | DbType::MariaDb)
    }
}

/// `[A-Za-z_][A-Za-z0-9_$]*`, same identifier grammar the quoting rules
/// assume.
fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c == '$' || c.is_ascii_alphanumeric())
}

/// `[a-z_][a-z0-9_]*`: safe to emit unquoted everywhere.
fn is_bare_safe(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_lowercase() || c.is_ascii_digit())
}
