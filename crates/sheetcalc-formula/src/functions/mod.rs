//! Built-in spreadsheet functions

pub mod logical;
pub mod math;
pub mod text;

use crate::ast::FormulaExpr;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{EvaluationContext, FormulaValue};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Implementation over evaluated arguments
pub type FunctionImpl = fn(&[FormulaValue], &EvaluationContext) -> FormulaResult<FormulaValue>;

/// Implementation over unevaluated argument expressions
///
/// The function decides which arguments to evaluate, so a branch that is
/// not taken is never evaluated.
pub type LazyFunctionImpl = fn(&[FormulaExpr], &EvaluationContext) -> FormulaResult<FormulaValue>;

/// How a function receives its arguments
#[derive(Clone, Copy)]
pub enum Implementation {
    Eager(FunctionImpl),
    Lazy(LazyFunctionImpl),
}

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: Implementation,
}

impl FunctionDef {
    /// Validate an argument count against the arity bounds
    pub fn check_arity(&self, actual: usize) -> FormulaResult<()> {
        if actual < self.min_args {
            return Err(FormulaError::ArgumentCount {
                function: self.name.to_string(),
                expected: format!("at least {}", self.min_args),
                actual,
            });
        }

        if let Some(max) = self.max_args {
            if actual > max {
                return Err(FormulaError::ArgumentCount {
                    function: self.name.to_string(),
                    expected: format!("at most {}", max),
                    actual,
                });
            }
        }

        Ok(())
    }
}

/// Function registry
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDef>,
}

static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

/// Global registry of built-in functions (lazily initialized)
pub fn registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };

        registry.register_math_functions();
        registry.register_logical_functions();
        registry.register_text_functions();

        registry
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_uppercase(), def);
    }

    /// Names of all registered functions, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.functions.values().map(|def| def.name).collect();
        names.sort_unstable();
        names
    }

    fn register_math_functions(&mut self) {
        self.register(FunctionDef {
            name: "SUM",
            min_args: 1,
            max_args: None,
            implementation: Implementation::Eager(math::fn_sum),
        });

        // Mean: AVG, AVERAGE and the Portuguese MEDIA are the same function
        for name in ["AVG", "AVERAGE", "MEDIA"] {
            self.register(FunctionDef {
                name,
                min_args: 0,
                max_args: None,
                implementation: Implementation::Eager(math::fn_average),
            });
        }

        self.register(FunctionDef {
            name: "MIN",
            min_args: 1,
            max_args: None,
            implementation: Implementation::Eager(math::fn_min),
        });

        self.register(FunctionDef {
            name: "MAX",
            min_args: 1,
            max_args: None,
            implementation: Implementation::Eager(math::fn_max),
        });

        self.register(FunctionDef {
            name: "COUNT",
            min_args: 1,
            max_args: None,
            implementation: Implementation::Eager(math::fn_count),
        });

        self.register(FunctionDef {
            name: "ABS",
            min_args: 1,
            max_args: Some(1),
            implementation: Implementation::Eager(math::fn_abs),
        });

        self.register(FunctionDef {
            name: "ROUND",
            min_args: 1,
            max_args: Some(2),
            implementation: Implementation::Eager(math::fn_round),
        });
    }

    fn register_logical_functions(&mut self) {
        self.register(FunctionDef {
            name: "IF",
            min_args: 2,
            max_args: Some(3),
            implementation: Implementation::Lazy(logical::fn_if),
        });

        self.register(FunctionDef {
            name: "AND",
            min_args: 1,
            max_args: None,
            implementation: Implementation::Eager(logical::fn_and),
        });

        self.register(FunctionDef {
            name: "OR",
            min_args: 1,
            max_args: None,
            implementation: Implementation::Eager(logical::fn_or),
        });

        self.register(FunctionDef {
            name: "NOT",
            min_args: 1,
            max_args: Some(1),
            implementation: Implementation::Eager(logical::fn_not),
        });
    }

    fn register_text_functions(&mut self) {
        self.register(FunctionDef {
            name: "CONCAT",
            min_args: 1,
            max_args: None,
            implementation: Implementation::Eager(text::fn_concat),
        });
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterate over arguments with ranges flattened into their members
pub(crate) fn flatten(args: &[FormulaValue]) -> impl Iterator<Item = &FormulaValue> {
    args.iter().flat_map(|arg| match arg {
        FormulaValue::Range(items) => items.iter(),
        other => std::slice::from_ref(other).iter(),
    })
}

/// Fetch a positional argument, failing if the caller skipped arity checks
pub(crate) fn arg<'v, T>(args: &'v [T], index: usize, function: &str) -> FormulaResult<&'v T> {
    args.get(index).ok_or_else(|| {
        FormulaError::Argument(format!("{} is missing argument {}", function, index + 1))
    })
}
