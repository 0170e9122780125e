use thiserror::Error;

/// Tokenization failures. Positions are character indices into the
/// expression string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unrecognized character '{ch}' at index {index}")]
    UnexpectedChar { ch: char, index: usize },
    #[error("invalid numeric literal '{text}' at index {index}")]
    InvalidNumber { text: String, index: usize },
    #[error("malformed bracket index in '{text}' at index {index}")]
    MalformedIndex { text: String, index: usize },
}

/// Structural failures while converting infix tokens to RPN.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unmatched closing parenthesis")]
    UnmatchedCloseParen,
    #[error("missing closing parenthesis")]
    MissingCloseParen,
    #[error("comma outside a function call")]
    MisplacedComma,
}

/// Anything that can stop an expression from compiling. Always fatal to the
/// node configuration and always raised before a render callback exists.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("operator '{op}' needs {needed} operands, only {available} available")]
    InsufficientOperands {
        op: String,
        needed: usize,
        available: usize,
    },
    #[error("unbalanced expression: {leftover} values left on the stack [{summary}]")]
    Unbalanced { leftover: usize, summary: String },
    #[error("unknown identifier '{name}'")]
    UnknownIdentifier { name: String },
    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },
    #[error("{region} index {index} out of bounds (length {len})")]
    IndexOutOfBounds {
        region: &'static str,
        index: usize,
        len: usize,
    },
}

/// Failures while assembling a generated program into an executable module.
/// Fatal to the owning node, never fatal to the host.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstantiateError {
    #[error("operand stack underflow at instruction {at}")]
    StackUnderflow { at: usize },
    #[error("store at instruction {at} expects stack depth 1, found {depth}")]
    UnbalancedStore { at: usize, depth: usize },
    #[error("{leftover} operands left on the stack at end of program")]
    LeftoverOperands { leftover: usize },
    #[error("misaligned byte offset {offset} at instruction {at}")]
    MisalignedOffset { offset: usize, at: usize },
    #[error("byte offset {offset} outside the {region} region at instruction {at}")]
    OffsetOutOfRegion {
        region: &'static str,
        offset: usize,
        at: usize,
    },
    #[error("program stores {stores} results but the layout declares {expected} equations")]
    StoreCountMismatch { stores: usize, expected: usize },
}

/// Configuration problems rejected synchronously at node construction,
/// before compilation or any asynchronous module build begins.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("empty equation set")]
    EmptySystem,
    #[error("duplicate name '{name}' across state and parameter sets")]
    DuplicateName { name: String },
    #[error("name '{name}' shadows a reserved identifier")]
    ReservedName { name: String },
    #[error("initial value for '{name}' is not finite")]
    NonFiniteInitial { name: String },
    #[error("value of parameter '{name}' is not finite")]
    NonFiniteParameter { name: String },
    #[error("{values} initial values supplied for {equations} equations")]
    InitialValueCount { values: usize, equations: usize },
    #[error("channels per equation must be at least 1")]
    ZeroChannels,
    #[error("time scale must be finite and positive, got {value}")]
    BadTimeScale { value: f64 },
}
