use crate::{compile_delete, compile_insert, compile_update, Command, Context};
use skein_core::{
    stmt::{Delete, Insert, Update},
    Result,
};

/// A write statement queued into a multi-statement batch.
#[derive(Debug, Clone)]
pub enum MultipleCommand {
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}

impl MultipleCommand {
    pub fn table_name(&self) -> &str {
        match self {
            MultipleCommand::Insert(insert) => &insert.entity.table_name,
            MultipleCommand::Update(update) => &update.entity().table_name,
            MultipleCommand::Delete(delete) => &delete.entity.table_name,
        }
    }
}

/// Renders queued statements into one `;`-joined command.
///
/// The `i`-th statement suffixes its parameter names with `_m{i}`, so
/// statements touching the same members never collide.
pub fn build_multi_command(cx: &Context, commands: &[MultipleCommand]) -> Result<Command> {
    let mut rendered = vec![];

    for (index, command) in commands.iter().enumerate() {
        let cx = cx.for_command(index);
        match command {
            MultipleCommand::Insert(insert) => rendered.extend(compile_insert(&cx, insert)?),
            MultipleCommand::Update(update) => rendered.push(compile_update(&cx, update)?),
            MultipleCommand::Delete(delete) => rendered.extend(compile_delete(&cx, delete)?),
        }
    }

    let command = Command::join(rendered);

    tracing::debug!(
        commands = commands.len(),
        statements = command.statements,
        param_count = command.params.len(),
        "MultipleCommand generated SQL"
    );

    Ok(command)
}

impl From<Insert> for MultipleCommand {
    fn from(value: Insert) -> Self {
        MultipleCommand::Insert(value)
    }
}

impl From<Update> for MultipleCommand {
    fn from(value: Update) -> Self {
        MultipleCommand::Update(value)
    }
}

impl From<Delete> for MultipleCommand {
    fn from(value: Delete) -> Self {
        MultipleCommand::Delete(value)
    }
}
