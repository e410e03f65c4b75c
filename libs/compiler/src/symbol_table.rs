// Cell 0    : Accumulator
// Cell 1    : Address scratch
// Cell 2    : Value scratch (element stores)
// Cell 3..  : Return cells, parameters, declarations, temporaries and iterators, in
//             allocation order. Nothing is ever freed.

use ast::{Declaration, Main, Parameter, ParameterKind, Procedure, Spanned};
use il::Address;
use log::trace;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

pub const ACCUMULATOR: Address = 0;
pub const ADDRESS_SCRATCH: Address = 1;
pub const VALUE_SCRATCH: Address = 2;
const FIRST_FREE_CELL: Address = 3;

/// Scope name of the main program body.
pub const MAIN_SCOPE: &str = "";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("line {1}: `{0}` has already been declared.")]
    DuplicateIdentifier(String, usize),

    #[error("line {1}: `{0}` is not declared.")]
    UndeclaredIdentifier(String, usize),

    #[error("line {line}: `{name}` is declared as {found}, but used as {expected}.")]
    KindMismatch {
        name: String,
        expected: ParameterKind,
        found: ParameterKind,
        line: usize,
    },

    #[error("line {line}: array `{name}` has an empty range [{start}:{end}].")]
    InvalidRange {
        name: String,
        start: i64,
        end: i64,
        line: usize,
    },

    #[error("line {1}: `{0}` does not fit into the address space.")]
    AddressSpace(String, usize),
}

impl Error {
    pub fn line(&self) -> usize {
        match self {
            Error::DuplicateIdentifier(_, line)
            | Error::UndeclaredIdentifier(_, line)
            | Error::AddressSpace(_, line) => *line,
            Error::KindMismatch { line, .. } | Error::InvalidRange { line, .. } => *line,
        }
    }
}

/// Where a name lives. A `Reference` cell holds the address of the real storage, for scalars
/// that is the value's cell, for arrays it is the array base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Direct(Address),
    Reference(Address),
}

impl Location {
    pub fn cell(&self) -> Address {
        match self {
            Location::Direct(cell) | Location::Reference(cell) => *cell,
        }
    }
}

/// Array bases are offsets, not cells: element `i` of an array lives at `base + i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    Scalar(Location),
    Array(Location),
}

impl Binding {
    fn kind(&self) -> ParameterKind {
        match self {
            Binding::Scalar(_) => ParameterKind::Scalar,
            Binding::Array(_) => ParameterKind::Array,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Parameter cells in declaration order.
    pub parameters: Vec<(Address, ParameterKind)>,
    /// Holds the instruction index a call returns to.
    pub return_cell: Address,
}

pub struct SymbolTable {
    bindings: HashMap<String, Binding>,
    shadowed: Vec<(String, Option<Binding>)>,
    procedures: HashMap<String, Signature>,
    iterators: HashSet<Address>,
    next_cell: Address,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self {
            bindings: HashMap::new(),
            shadowed: Vec::new(),
            procedures: HashMap::new(),
            iterators: HashSet::new(),
            next_cell: FIRST_FREE_CELL,
        }
    }
}

fn qualified(scope: &str, name: &str) -> String {
    format!("{scope}::{name}")
}

impl SymbolTable {
    /// Hands out `cells` consecutive cells for `name`.
    fn allocate(&mut self, cells: i64, name: &str, line: usize) -> Result<Address, Error> {
        let first = self.next_cell;
        self.next_cell = first
            .checked_add(cells)
            .ok_or_else(|| Error::AddressSpace(name.to_string(), line))?;
        Ok(first)
    }

    fn bind(
        &mut self,
        scope: &str,
        name: &str,
        binding: Binding,
        line: usize,
    ) -> Result<(), Error> {
        let key = qualified(scope, name);
        if self.bindings.contains_key(&key) {
            return Err(Error::DuplicateIdentifier(name.to_string(), line));
        }

        trace!("{key} -> {binding:?}");
        self.bindings.insert(key, binding);
        Ok(())
    }

    fn lookup(&self, scope: &str, name: &str, line: usize) -> Result<Binding, Error> {
        self.bindings
            .get(&qualified(scope, name))
            .copied()
            .ok_or_else(|| Error::UndeclaredIdentifier(name.to_string(), line))
    }

    /// Reserves storage for a local scalar or array of `scope`.
    pub fn declare(
        &mut self,
        scope: &str,
        declaration: &Declaration,
        line: usize,
    ) -> Result<(), Error> {
        match declaration {
            Declaration::Scalar(name) => {
                let cell = self.allocate(1, name, line)?;
                self.bind(scope, name, Binding::Scalar(Location::Direct(cell)), line)
            }
            Declaration::Array { name, start, end } => {
                if end < start {
                    return Err(Error::InvalidRange {
                        name: name.clone(),
                        start: *start,
                        end: *end,
                        line,
                    });
                }

                let too_large = || Error::AddressSpace(name.clone(), line);
                let length = end
                    .checked_sub(*start)
                    .and_then(|span| span.checked_add(1))
                    .ok_or_else(too_large)?;
                let base = self.next_cell.checked_sub(*start).ok_or_else(too_large)?;
                self.allocate(length, name, line)?;
                self.bind(scope, name, Binding::Array(Location::Direct(base)), line)
            }
        }
    }

    fn declare_parameter(
        &mut self,
        scope: &str,
        parameter: &Parameter,
        line: usize,
    ) -> Result<Address, Error> {
        let cell = self.allocate(1, &parameter.name, line)?;
        let binding = match parameter.kind {
            ParameterKind::Scalar => Binding::Scalar(Location::Reference(cell)),
            ParameterKind::Array => Binding::Array(Location::Reference(cell)),
        };
        self.bind(scope, &parameter.name, binding, line)?;
        Ok(cell)
    }

    /// Registers a procedure: its return cell first, then one reference cell per parameter, then
    /// its locals, all under the procedure's own scope.
    pub fn declare_procedure(&mut self, procedure: &Procedure) -> Result<(), Error> {
        let Spanned { line, node: name } = &procedure.name;

        if self.procedures.contains_key(name) {
            return Err(Error::DuplicateIdentifier(name.clone(), *line));
        }

        let return_cell = self.allocate(1, name, *line)?;
        let mut parameters = Vec::with_capacity(procedure.parameters.len());

        for parameter in &procedure.parameters {
            let cell = self.declare_parameter(name, parameter, *line)?;
            parameters.push((cell, parameter.kind));
        }

        for declaration in &procedure.declarations {
            self.declare(name, declaration, declaration.line)?;
        }

        trace!("procedure {name}: return cell {return_cell}, parameters {parameters:?}");

        self.procedures.insert(
            name.clone(),
            Signature {
                parameters,
                return_cell,
            },
        );
        Ok(())
    }

    pub fn declare_main(&mut self, main: &Main) -> Result<(), Error> {
        for declaration in &main.declarations {
            self.declare(MAIN_SCOPE, declaration, declaration.line)?;
        }
        Ok(())
    }

    pub fn kind_of(&self, scope: &str, name: &str, line: usize) -> Result<ParameterKind, Error> {
        Ok(self.lookup(scope, name, line)?.kind())
    }

    pub fn resolve_scalar(&self, scope: &str, name: &str, line: usize) -> Result<Location, Error> {
        match self.lookup(scope, name, line)? {
            Binding::Scalar(location) => Ok(location),
            Binding::Array(_) => Err(Error::KindMismatch {
                name: name.to_string(),
                expected: ParameterKind::Scalar,
                found: ParameterKind::Array,
                line,
            }),
        }
    }

    pub fn resolve_array(&self, scope: &str, name: &str, line: usize) -> Result<Location, Error> {
        match self.lookup(scope, name, line)? {
            Binding::Array(location) => Ok(location),
            Binding::Scalar(_) => Err(Error::KindMismatch {
                name: name.to_string(),
                expected: ParameterKind::Array,
                found: ParameterKind::Scalar,
                line,
            }),
        }
    }

    /// A scratch cell for the expression on `line`.
    pub fn new_temporary(&mut self, line: usize) -> Result<Address, Error> {
        let cell = self.allocate(1, "temporary", line)?;
        trace!("temporary -> {cell}");
        Ok(cell)
    }

    fn mark_iterator(&mut self, cell: Address) {
        self.iterators.insert(cell);
    }

    pub fn is_iterator(&self, cell: Address) -> bool {
        self.iterators.contains(&cell)
    }

    /// Binds a `for` control variable to a fresh protected cell. Any binding of the same name in
    /// `scope` is hidden until the matching `unbind_iterator`.
    pub fn bind_iterator(
        &mut self,
        scope: &str,
        name: &str,
        line: usize,
    ) -> Result<Address, Error> {
        let cell = self.allocate(1, name, line)?;
        self.mark_iterator(cell);

        let key = qualified(scope, name);
        let previous = self
            .bindings
            .insert(key.clone(), Binding::Scalar(Location::Direct(cell)));
        trace!("iterator {key} -> {cell}");

        self.shadowed.push((key, previous));
        Ok(cell)
    }

    /// Restores whatever the innermost `bind_iterator` hid.
    pub fn unbind_iterator(&mut self) {
        let Some((key, previous)) = self.shadowed.pop() else {
            return;
        };

        match previous {
            Some(binding) => self.bindings.insert(key, binding),
            None => self.bindings.remove(&key),
        };
    }

    pub fn signature(&self, procedure: &str) -> Option<&Signature> {
        self.procedures.get(procedure)
    }

    /// First cell that has not been handed out yet.
    pub fn next_free_cell(&self) -> Address {
        self.next_cell
    }
}
