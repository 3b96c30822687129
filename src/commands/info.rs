use crate::{
    commands::{CommandError, CommandResult},
    replication::Role,
    resp::RespValue,
};

enum InfoSection {
    All,
    Replication,
    Unknown,
}

pub struct InfoArguments {
    section: InfoSection,
}

impl InfoArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() > 1 {
            return Err(CommandError::InvalidInfoCommand);
        }

        let section = match arguments.first().map(|s| s.to_lowercase()).as_deref() {
            None | Some("all") | Some("default") | Some("everything") => InfoSection::All,
            Some("replication") => InfoSection::Replication,
            Some(_) => InfoSection::Unknown,
        };

        Ok(InfoArguments { section })
    }
}

/// `INFO [section]`. Only the replication section is reported; other
/// sections reply with an empty bulk string.
pub async fn info(role: &Role, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let info_arguments = InfoArguments::parse(arguments)?;

    let body = match info_arguments.section {
        InfoSection::All | InfoSection::Replication => {
            let mut lines = vec!["# Replication".to_string()];
            lines.extend(role.info_lines().await);
            lines.join("\r\n")
        }
        InfoSection::Unknown => String::new(),
    };

    Ok(CommandResult::Response(RespValue::BulkString(body).encode()))
}
