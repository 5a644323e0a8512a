#[derive(Debug)]
pub struct Capability {
    /// Executes several `;`-joined statements in one round trip, returning
    /// one result per statement.
    pub multiple_statements: bool,

    /// Binds parameters by `@name` rather than by position.
    pub named_parameters: bool,

    /// Upper bound on parameters in one round trip, when the database has one.
    pub max_parameters: Option<usize>,
}

impl Capability {
    /// SQLite capabilities.
    pub const SQLITE: Self = Self {
        multiple_statements: true,
        named_parameters: true,
        max_parameters: Some(32_766),
    };

    /// PostgreSQL capabilities.
    pub const POSTGRESQL: Self = Self {
        multiple_statements: false,
        named_parameters: false,
        max_parameters: Some(65_535),
    };

    /// MySQL capabilities.
    pub const MYSQL: Self = Self {
        multiple_statements: true,
        named_parameters: false,
        max_parameters: Some(65_535),
    };
}
