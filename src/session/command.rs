use crate::core::{AdminError, Result};

pub const USAGE: &str = "
    help               --print this help
    list               --list all proxy groups
    list *             --list all proxy groups and their members
    list id            --list the members of one group
    set * password     --set the same password on every redis instance
    set id password    --set the password of one redis instance
    passwd             --show the stored password of every redis instance
    exit               --exit

***** Any other command is ignored *****
";

/// What a command applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    All,
    Id(usize),
}

impl Selector {
    fn parse(arg: &str) -> Result<Self> {
        if arg == "*" {
            return Ok(Self::All);
        }
        arg.parse::<usize>()
            .map(Self::Id)
            .map_err(|_| AdminError::invalid_argument(format!("not a valid id: {}", arg)))
    }
}

/// One operator command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    /// `None` lists the groups themselves
    List(Option<Selector>),
    Set { target: Selector, password: String },
    Passwd,
}

impl Command {
    /// Parse one input line.
    ///
    /// Blank lines and unknown command words give `Ok(None)`. Only the first
    /// three words are considered; the command word is case-insensitive.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Ok(None);
        };
        let first = words.next();
        let second = words.next();

        let command = match word.to_ascii_lowercase().as_str() {
            "help" => Self::Help,
            "exit" => Self::Exit,
            "passwd" => Self::Passwd,
            "list" => Self::List(first.map(Selector::parse).transpose()?),
            "set" => {
                let password = second
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| AdminError::invalid_argument("no password specified"))?;
                let target = first
                    .map(Selector::parse)
                    .transpose()?
                    .ok_or_else(|| AdminError::invalid_argument("no target specified"))?;
                Self::Set {
                    target,
                    password: password.to_string(),
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(command))
    }
}
