use super::BulkString;

/// Builds a [`Command`] for the given opcode.
///
/// Multi-word opcodes (`CLIENT SETNAME`, `OBJECT ENCODING`, ...) are passed
/// as a single string here and split into two bulk-string arguments by
/// [`Command::name_args`] at encode time.
pub fn cmd(name: &'static str) -> Command {
    Command::new(name)
}

/// An immutable, opaque Redis command: an opcode plus an ordered sequence
/// of binary argument blobs. Built once via the fluent
/// `.arg()`/`.args()` API and never mutated again.
#[derive(Debug, Clone)]
pub struct Command {
    pub name: &'static str,
    pub args: CommandArgs,
}

impl Command {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            args: CommandArgs::Empty,
        }
    }

    #[must_use]
    pub fn arg<T>(mut self, arg: T) -> Self
    where
        T: Into<BulkString>,
    {
        self.args = self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<A>(self, args: A) -> Self
    where
        A: IntoArgs,
    {
        args.into_args(self)
    }

    /// Number of bulk-string arguments, not counting the opcode itself.
    pub fn num_args(&self) -> usize {
        self.args.len()
    }

    /// The words that make up the opcode: `"CLIENT SETNAME"` becomes
    /// `["CLIENT", "SETNAME"]`, a plain `"GET"` becomes `["GET"]`.
    pub fn name_words(&self) -> impl Iterator<Item = &'static str> {
        self.name.split(' ').filter(|w| !w.is_empty())
    }

    pub fn iter_args(&self) -> impl Iterator<Item = &BulkString> {
        self.args.iter()
    }
}

/// A small-size-optimized list of command arguments: most Redis commands
/// take 0-4 arguments, so those sizes are stored inline and only larger
/// commands spill onto the heap.
#[derive(Debug, Clone)]
pub enum CommandArgs {
    Empty,
    Single(BulkString),
    Array2([BulkString; 2]),
    Array3([BulkString; 3]),
    Array4([BulkString; 4]),
    Vec(Vec<BulkString>),
}

impl CommandArgs {
    fn push(self, arg: BulkString) -> Self {
        match self {
            CommandArgs::Empty => CommandArgs::Single(arg),
            CommandArgs::Single(a) => CommandArgs::Array2([a, arg]),
            CommandArgs::Array2([a, b]) => CommandArgs::Array3([a, b, arg]),
            CommandArgs::Array3([a, b, c]) => CommandArgs::Array4([a, b, c, arg]),
            CommandArgs::Array4([a, b, c, d]) => CommandArgs::Vec(vec![a, b, c, d, arg]),
            CommandArgs::Vec(mut vec) => {
                vec.push(arg);
                CommandArgs::Vec(vec)
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CommandArgs::Empty => 0,
            CommandArgs::Single(_) => 1,
            CommandArgs::Array2(_) => 2,
            CommandArgs::Array3(_) => 3,
            CommandArgs::Array4(_) => 4,
            CommandArgs::Vec(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &BulkString> {
        match self {
            CommandArgs::Empty => [].iter(),
            CommandArgs::Single(a) => std::slice::from_ref(a).iter(),
            CommandArgs::Array2(a) => a.iter(),
            CommandArgs::Array3(a) => a.iter(),
            CommandArgs::Array4(a) => a.iter(),
            CommandArgs::Vec(v) => v.iter(),
        }
    }
}

/// Types that can be appended in bulk to a [`Command`] being built.
pub trait IntoArgs {
    fn into_args(self, command: Command) -> Command;
}

impl<T> IntoArgs for Vec<T>
where
    T: Into<BulkString>,
{
    fn into_args(self, command: Command) -> Command {
        self.into_iter().fold(command, |c, arg| c.arg(arg))
    }
}

impl<'a, T> IntoArgs for &'a [T]
where
    T: Into<BulkString> + Clone,
{
    fn into_args(self, command: Command) -> Command {
        self.iter().cloned().fold(command, |c, arg| c.arg(arg))
    }
}

impl IntoArgs for BulkString {
    fn into_args(self, command: Command) -> Command {
        command.arg(self)
    }
}

impl IntoArgs for &'static str {
    fn into_args(self, command: Command) -> Command {
        command.arg(BulkString::from(self))
    }
}

impl IntoArgs for String {
    fn into_args(self, command: Command) -> Command {
        command.arg(BulkString::from(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_opcode_and_args_in_order() {
        let c = cmd("MGET").arg("key1").arg("key2").arg("key3");
        assert_eq!(c.name, "MGET");
        let args: Vec<_> = c.iter_args().map(|a| a.to_string()).collect();
        assert_eq!(args, vec!["key1", "key2", "key3"]);
    }

    #[test]
    fn args_bulk_append_preserves_order() {
        let c = cmd("DEL").args(vec!["a", "b", "c"]);
        let args: Vec<_> = c.iter_args().map(|a| a.to_string()).collect();
        assert_eq!(args, vec!["a", "b", "c"]);
    }

    #[test]
    fn multi_word_opcode_splits_on_space() {
        let c = cmd("CLIENT SETNAME").arg("conn1");
        let words: Vec<_> = c.name_words().collect();
        assert_eq!(words, vec!["CLIENT", "SETNAME"]);
    }
}
