use snafu::Snafu;

/// A parsed shell command, one per input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MakeDir { path: String, create_parents: bool },
    ChangeDir { path: String },
    List { path: Option<String> },
    PrintWorkingDir,
    Touch { path: String },
    Echo { path: String, text: String },
    Cat { path: String },
    Grep { path: String, pattern: String },
    Find {
        path: String,
        pattern: String,
        content: bool,
        ignore_case: bool,
    },
    Move {
        source: String,
        destination: String,
        overwrite: bool,
    },
    Copy {
        source: String,
        destination: String,
        overwrite: bool,
    },
    Remove { path: String },
    Help,
    Exit,
}

impl Command {
    /// Whether executing this command can change persisted state (the
    /// tree or the current directory).
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            Command::MakeDir { .. }
                | Command::ChangeDir { .. }
                | Command::Touch { .. }
                | Command::Echo { .. }
                | Command::Move { .. }
                | Command::Copy { .. }
                | Command::Remove { .. }
        )
    }
}

/// Parses one whitespace-separated input line. Flags (`-p`, `-f`, `-c`,
/// `-i`) may appear anywhere after the verb.
pub fn parse(line: &str) -> Result<Command, CommandParseError> {
    let mut parts = line.split_whitespace();
    let verb = parts.next().ok_or(CommandParseError::EmptyLine)?;
    let (flags, args): (Vec<&str>, Vec<&str>) =
        parts.partition(|part| part.starts_with('-') && part.len() > 1);

    let command = match verb {
        "mkdir" => Command::MakeDir {
            path: required(verb, &args, 0, "path")?,
            create_parents: flag(verb, &flags, &["-p"])?,
        },
        "cd" => Command::ChangeDir {
            path: required(verb, &args, 0, "path")?,
        },
        "ls" => Command::List {
            path: args.first().map(|s| s.to_string()),
        },
        "pwd" => Command::PrintWorkingDir,
        "touch" => Command::Touch {
            path: required(verb, &args, 0, "path")?,
        },
        "echo" => Command::Echo {
            path: required(verb, &args, 0, "file")?,
            text: rest(verb, &args, 1, "text")?,
        },
        "cat" => Command::Cat {
            path: required(verb, &args, 0, "file")?,
        },
        "grep" => Command::Grep {
            path: required(verb, &args, 0, "file")?,
            pattern: required(verb, &args, 1, "pattern")?,
        },
        "find" => {
            let content = flag(verb, &flags, &["-c", "-i"])?;
            let ignore_case = flags.contains(&"-i");
            Command::Find {
                path: required(verb, &args, 0, "path")?,
                pattern: required(verb, &args, 1, "pattern")?,
                content,
                ignore_case,
            }
        }
        "mv" => Command::Move {
            source: required(verb, &args, 0, "source")?,
            destination: required(verb, &args, 1, "destination")?,
            overwrite: flag(verb, &flags, &["-f"])?,
        },
        "cp" => Command::Copy {
            source: required(verb, &args, 0, "source")?,
            destination: required(verb, &args, 1, "destination")?,
            overwrite: flag(verb, &flags, &["-f"])?,
        },
        "rm" => Command::Remove {
            path: required(verb, &args, 0, "path")?,
        },
        "help" => Command::Help,
        "exit" | "quit" => Command::Exit,
        other => {
            return UnknownCommandSnafu { verb: other }.fail();
        }
    };

    // Echo swallows everything after the file name; every other verb has
    // a fixed argument count.
    let expected = match &command {
        Command::Echo { .. } => usize::MAX,
        Command::Grep { .. } | Command::Find { .. } | Command::Move { .. } | Command::Copy { .. } => 2,
        Command::PrintWorkingDir | Command::Help | Command::Exit => 0,
        Command::List { path } => usize::from(path.is_some()),
        _ => 1,
    };
    if args.len() > expected {
        return UnexpectedArgumentSnafu {
            verb,
            argument: args[expected],
        }
        .fail();
    }

    Ok(command)
}

fn required(
    verb: &str,
    args: &[&str],
    index: usize,
    what: &str,
) -> Result<String, CommandParseError> {
    args.get(index)
        .map(|s| s.to_string())
        .ok_or_else(|| CommandParseError::MissingArgument {
            verb: verb.to_string(),
            what: what.to_string(),
        })
}

/// Joins `args[index..]` back into one string, e.g. the text of `echo`.
fn rest(verb: &str, args: &[&str], index: usize, what: &str) -> Result<String, CommandParseError> {
    if args.len() <= index {
        return MissingArgumentSnafu { verb, what }.fail();
    }
    Ok(args[index..].join(" "))
}

/// Validates that every given flag is in `known`, returning whether the
/// first known flag is present.
fn flag(verb: &str, flags: &[&str], known: &[&str]) -> Result<bool, CommandParseError> {
    for flag in flags {
        if !known.contains(flag) {
            return UnknownFlagSnafu { verb, flag: *flag }.fail();
        }
    }
    Ok(flags.contains(&known[0]))
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CommandParseError {
    #[snafu(display("Empty command line"))]
    EmptyLine,
    #[snafu(display("Unknown command '{}' (try 'help')", verb))]
    UnknownCommand { verb: String },
    #[snafu(display("'{}' is missing its {} argument", verb, what))]
    MissingArgument { verb: String, what: String },
    #[snafu(display("Unknown flag '{}' for '{}'", flag, verb))]
    UnknownFlag { verb: String, flag: String },
    #[snafu(display("Unexpected argument '{}' for '{}'", argument, verb))]
    UnexpectedArgument { verb: String, argument: String },
}
