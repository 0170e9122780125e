use crate::error::{CompileError, ConfigError};
use crate::lexer::Token;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The reserved full-turn angle constant, substituted by name.
pub const TWO_PI: f64 = std::f64::consts::TAU;

/// Which array of the module's linear memory an access refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    State,
    Param,
}

impl Region {
    pub fn label(self) -> &'static str {
        match self {
            Region::State => "state",
            Region::Param => "parameter",
        }
    }

    /// Short array name used in source syntax and diagnostics.
    pub fn array_name(self) -> char {
        match self {
            Region::State => 'y',
            Region::Param => 'p',
        }
    }
}

/// The fixed set of recognized functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
    Sqrt,
    Abs,
}

impl Func {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Func::Sin),
            "cos" => Some(Func::Cos),
            "tan" => Some(Func::Tan),
            "exp" => Some(Func::Exp),
            "log" => Some(Func::Log),
            "sqrt" => Some(Func::Sqrt),
            "abs" => Some(Func::Abs),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Exp => "exp",
            Func::Log => "log",
            Func::Sqrt => "sqrt",
            Func::Abs => "abs",
        }
    }
}

/// Token stream after symbol resolution: no names remain, only positional
/// accesses, literals, the time symbol, function markers, and structure.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedToken {
    Number(f64),
    Time,
    Access { region: Region, index: usize },
    Func(Func),
    Op(char),
    LParen,
    RParen,
}

/// Name → index tables for one equation system. Declaration order is the
/// canonical vector order and never changes after construction.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    state: HashMap<String, usize>,
    params: HashMap<String, usize>,
    state_len: usize,
    param_len: usize,
}

impl SymbolTable {
    /// Builds the tables, rejecting duplicate names (within a set or across
    /// the two sets) and names shadowing a reserved identifier
    /// (`t`, `TWO_PI`, `y`, `p`, or a function name).
    pub fn new(state_names: &[String], param_names: &[String]) -> Result<Self, ConfigError> {
        let mut state = HashMap::new();
        for (index, name) in state_names.iter().enumerate() {
            check_reserved(name)?;
            if state.insert(name.clone(), index).is_some() {
                return Err(ConfigError::DuplicateName { name: name.clone() });
            }
        }
        let mut params = HashMap::new();
        for (index, name) in param_names.iter().enumerate() {
            check_reserved(name)?;
            if state.contains_key(name) || params.insert(name.clone(), index).is_some() {
                return Err(ConfigError::DuplicateName { name: name.clone() });
            }
        }
        Ok(Self {
            state,
            params,
            state_len: state_names.len(),
            param_len: param_names.len(),
        })
    }

    pub fn state_len(&self) -> usize {
        self.state_len
    }

    pub fn param_len(&self) -> usize {
        self.param_len
    }

    /// Rewrites every identifier token into its positional form. Explicit
    /// `y[i]`/`p[j]` accesses are bounds-checked against the declared
    /// lengths here, so no index can escape to runtime.
    pub fn resolve(&self, tokens: &[Token]) -> Result<Vec<ResolvedToken>, CompileError> {
        let mut out = Vec::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            let resolved = match token {
                Token::Number(value) => ResolvedToken::Number(*value),
                Token::Op(op) => ResolvedToken::Op(*op),
                Token::LParen => ResolvedToken::LParen,
                Token::RParen => ResolvedToken::RParen,
                Token::Ident(name) => {
                    if let Some(&index) = self.state.get(name) {
                        ResolvedToken::Access {
                            region: Region::State,
                            index,
                        }
                    } else if let Some(&index) = self.params.get(name) {
                        ResolvedToken::Access {
                            region: Region::Param,
                            index,
                        }
                    } else if name == "t" {
                        ResolvedToken::Time
                    } else if name == "TWO_PI" {
                        ResolvedToken::Number(TWO_PI)
                    } else if let Some(func) = Func::from_name(name) {
                        ResolvedToken::Func(func)
                    } else if matches!(tokens.get(i + 1), Some(Token::LParen)) {
                        return Err(CompileError::UnknownFunction { name: name.clone() });
                    } else {
                        return Err(CompileError::UnknownIdentifier { name: name.clone() });
                    }
                }
                Token::Indexed { name, index } => {
                    let (region, len) = match name.as_str() {
                        "y" => (Region::State, self.state_len),
                        "p" => (Region::Param, self.param_len),
                        _ => {
                            return Err(CompileError::UnknownIdentifier {
                                name: format!("{name}[{index}]"),
                            })
                        }
                    };
                    if *index >= len {
                        return Err(CompileError::IndexOutOfBounds {
                            region: region.label(),
                            index: *index,
                            len,
                        });
                    }
                    ResolvedToken::Access {
                        region,
                        index: *index,
                    }
                }
            };
            out.push(resolved);
        }
        Ok(out)
    }
}

fn check_reserved(name: &str) -> Result<(), ConfigError> {
    if name == "t" || name == "TWO_PI" || name == "y" || name == "p" || Func::from_name(name).is_some()
    {
        return Err(ConfigError::ReservedName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn table() -> SymbolTable {
        SymbolTable::new(&names(&["x", "v"]), &names(&["w", "damp"])).expect("table")
    }

    #[test]
    fn resolves_declared_names_to_canonical_indices() {
        let tokens = tokenize("x + v * w - damp").expect("tokens");
        let resolved = table().resolve(&tokens).expect("resolved");
        assert_eq!(
            resolved,
            vec![
                ResolvedToken::Access {
                    region: Region::State,
                    index: 0
                },
                ResolvedToken::Op('+'),
                ResolvedToken::Access {
                    region: Region::State,
                    index: 1
                },
                ResolvedToken::Op('*'),
                ResolvedToken::Access {
                    region: Region::Param,
                    index: 0
                },
                ResolvedToken::Op('-'),
                ResolvedToken::Access {
                    region: Region::Param,
                    index: 1
                },
            ]
        );
    }

    #[test]
    fn substitutes_reserved_constant_and_time() {
        let tokens = tokenize("TWO_PI * t").expect("tokens");
        let resolved = table().resolve(&tokens).expect("resolved");
        assert_eq!(resolved[0], ResolvedToken::Number(TWO_PI));
        assert_eq!(resolved[2], ResolvedToken::Time);
    }

    #[test]
    fn passes_function_names_through() {
        let tokens = tokenize("sin(x)").expect("tokens");
        let resolved = table().resolve(&tokens).expect("resolved");
        assert_eq!(resolved[0], ResolvedToken::Func(Func::Sin));
    }

    #[test]
    fn accepts_explicit_indices_in_bounds() {
        let tokens = tokenize("y[1] + p[0]").expect("tokens");
        let resolved = table().resolve(&tokens).expect("resolved");
        assert_eq!(
            resolved[0],
            ResolvedToken::Access {
                region: Region::State,
                index: 1
            }
        );
    }

    #[test]
    fn rejects_out_of_bounds_index_at_compile_time() {
        let tokens = tokenize("y[2]").expect("tokens");
        let err = table().resolve(&tokens).unwrap_err();
        assert_eq!(
            err,
            CompileError::IndexOutOfBounds {
                region: "state",
                index: 2,
                len: 2
            }
        );
    }

    #[test]
    fn rejects_unknown_identifier() {
        let tokens = tokenize("q + 1").expect("tokens");
        assert!(matches!(
            table().resolve(&tokens),
            Err(CompileError::UnknownIdentifier { .. })
        ));
    }

    #[test]
    fn unknown_name_before_paren_is_unknown_function() {
        let tokens = tokenize("sinh(x)").expect("tokens");
        assert!(matches!(
            table().resolve(&tokens),
            Err(CompileError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn prefix_names_do_not_collide() {
        // "w" must not capture the prefix of "w2": resolution is by whole
        // identifier, not substring.
        let table = SymbolTable::new(&names(&["x"]), &names(&["w", "w2"])).expect("table");
        let tokens = tokenize("w2").expect("tokens");
        let resolved = table.resolve(&tokens).expect("resolved");
        assert_eq!(
            resolved,
            vec![ResolvedToken::Access {
                region: Region::Param,
                index: 1
            }]
        );
    }

    #[test]
    fn rejects_name_collision_across_sets() {
        let err = SymbolTable::new(&names(&["x"]), &names(&["x"])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateName {
                name: "x".to_string()
            }
        );
    }

    #[test]
    fn rejects_reserved_names() {
        assert!(matches!(
            SymbolTable::new(&names(&["t"]), &[]),
            Err(ConfigError::ReservedName { .. })
        ));
        assert!(matches!(
            SymbolTable::new(&[], &names(&["sin"])),
            Err(ConfigError::ReservedName { .. })
        ));
        assert!(matches!(
            SymbolTable::new(&names(&["y"]), &[]),
            Err(ConfigError::ReservedName { .. })
        ));
    }
}
