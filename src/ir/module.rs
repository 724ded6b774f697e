use super::body::Body;
use super::types::Ty;

/// Index of a function within a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncId(pub usize);

/// A module: an ordered collection of function definitions and
/// declarations whose names form the symbol table.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub functions: Vec<Function>,
}

impl Module {
    #[must_use]
    pub fn function(&self, id: FuncId) -> Option<&Function> {
        self.functions.get(id.0)
    }

    #[must_use]
    pub fn function_mut(&mut self, id: FuncId) -> Option<&mut Function> {
        self.functions.get_mut(id.0)
    }

    /// Look up a function by symbol name.
    #[must_use]
    pub fn function_index(&self, name: &str) -> Option<FuncId> {
        self.functions
            .iter()
            .position(|function| function.name == name)
            .map(FuncId)
    }

    pub fn push_function(&mut self, function: Function) -> FuncId {
        let id = FuncId(self.functions.len());
        self.functions.push(function);
        id
    }

    /// Return the function named `name`, inserting a body-less declaration
    /// with the given signature and attributes if no such symbol exists.
    /// An existing function is reused as-is, whatever its signature.
    pub fn get_or_insert_declaration(
        &mut self,
        name: &str,
        signature: FnSig,
        attributes: FnAttributes,
    ) -> FuncId {
        if let Some(id) = self.function_index(name) {
            return id;
        }
        self.push_function(Function {
            name: name.to_string(),
            signature,
            attributes,
            body: None,
        })
    }
}

/// A function definition (`body` present) or declaration (`body` absent).
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub signature: FnSig,
    pub attributes: FnAttributes,
    pub body: Option<Body>,
}

impl Function {
    #[must_use]
    pub fn is_declaration(&self) -> bool {
        self.body.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnSig {
    pub params: Vec<Ty>,
    pub ret: Ty,
}

impl FnSig {
    /// Zero-argument, unit-returning marker signature.
    #[must_use]
    pub fn marker() -> Self {
        Self {
            params: Vec::new(),
            ret: Ty::Unit,
        }
    }
}

/// Function-level attributes consumed by downstream analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FnAttributes {
    /// The function never returns to its caller.
    pub no_return: bool,
    /// The function reads no memory and has no side effects. A function
    /// that is both `no_return` and `read_none` is legal for an optimiser
    /// to delete outright, so the two must not be combined on markers
    /// whose presence is the point.
    pub read_none: bool,
}
