use skein_core::driver::{Param, QuerySql};

/// SQL for one round trip: one or more `;`-joined statements and their
/// parameters in placeholder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    pub sql: String,
    pub params: Vec<Param>,

    /// Number of statements, which is the number of result sets the
    /// database returns
    pub statements: usize,
}

impl Command {
    /// Concatenates commands into one batch.
    pub fn join(commands: impl IntoIterator<Item = Command>) -> Command {
        let mut ret = Command::default();
        for command in commands {
            if !ret.sql.is_empty() && !command.sql.is_empty() {
                ret.sql.push(';');
            }
            ret.sql.push_str(&command.sql);
            ret.params.extend(command.params);
            ret.statements += command.statements;
        }
        ret
    }

    pub fn is_empty(&self) -> bool {
        self.statements == 0
    }
}

impl From<Command> for QuerySql {
    fn from(value: Command) -> Self {
        QuerySql {
            sql: value.sql,
            params: value.params,
        }
    }
}
