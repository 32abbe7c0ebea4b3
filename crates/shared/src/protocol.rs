use crate::error::CommandError;

/// Commands the input loop sends to the stopwatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Reset,
    Quit,
}

impl Command {
    pub const ALL: [Command; 4] = [Command::Start, Command::Stop, Command::Reset, Command::Quit];

    /// Maps a single keypress to a command, ignoring case.
    pub fn from_key(key: char) -> Result<Self, CommandError> {
        match key.to_ascii_uppercase() {
            'S' => Ok(Command::Start),
            'T' => Ok(Command::Stop),
            'R' => Ok(Command::Reset),
            'Q' => Ok(Command::Quit),
            _ => Err(CommandError::Invalid(key)),
        }
    }

    pub fn key(self) -> char {
        match self {
            Command::Start => 'S',
            Command::Stop => 'T',
            Command::Reset => 'R',
            Command::Quit => 'Q',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Command::Start => "Start",
            Command::Stop => "Stop",
            Command::Reset => "Reset",
            Command::Quit => "Quit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_case_insensitively() {
        for command in Command::ALL {
            let upper = command.key();
            assert_eq!(Command::from_key(upper), Ok(command));
            assert_eq!(Command::from_key(upper.to_ascii_lowercase()), Ok(command));
        }
    }

    #[test]
    fn rejects_unknown_keys() {
        assert_eq!(Command::from_key('x'), Err(CommandError::Invalid('x')));
        assert_eq!(Command::from_key(' '), Err(CommandError::Invalid(' ')));
        assert_eq!(Command::from_key('é'), Err(CommandError::Invalid('é')));
    }
}
