//! IR value registry (§4.B)
//!
//! A [`Value`] bundles a textual IR name, its [`Type`], and a storage
//! classification. The registry is responsible for handing out fresh names —
//! temporary numbering must exactly match the emitted instruction sequence,
//! so callers allocate a name and emit the defining instruction atomically.

use crate::types::Type;
use std::collections::BTreeSet;

/// Storage classification of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// An SSA register holding a value directly (not an address).
    Immediate,
    /// The address of an automatic variable (`alloca`'d). Loadable/storable.
    StackSlot,
    /// The address of a module-level global. Loadable/storable.
    Global,
    /// A function symbol, called directly by name.
    Function,
    /// A literal constant (e.g. an integer/float immediate). Not an address.
    Literal,
}

/// A named, typed IR value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub name: String,
    pub ty: Type,
    pub storage: Storage,
}

impl Value {
    pub fn new(name: impl Into<String>, ty: Type, storage: Storage) -> Self {
        Value {
            name: name.into(),
            ty,
            storage,
        }
    }

    /// A value is loadable/storable only when it denotes an address.
    pub fn is_addressable(&self) -> bool {
        matches!(self.storage, Storage::StackSlot | Storage::Global)
    }

    /// The textual form this value contributes to an IR operand, e.g. `%3`
    /// or `@x` or `42`.
    pub fn operand(&self) -> &str {
        &self.name
    }
}

/// Per-function/per-module temporary and global name allocator.
///
/// `temp_counter` is reset on entering a function (`reset_function`), which
/// keeps `%N` dense from zero per function as required by §8 property 1.
#[derive(Debug, Default)]
pub struct ValueRegistry {
    temp_counter: u64,
    local_name_counter: u64,
    globals: Vec<Value>,
    undefined_globals: BTreeSet<String>,
}

impl ValueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset temporary numbering on entering a new function.
    pub fn reset_function(&mut self) {
        self.temp_counter = 0;
    }

    /// Allocate the next `%N` for the current function.
    pub fn new_temp(&mut self, ty: Type) -> Value {
        let name = format!("%{}", self.temp_counter);
        self.temp_counter += 1;
        Value::new(name, ty, Storage::Immediate)
    }

    /// A fresh integer for forming unique block labels (e.g. `iftrue.7`).
    pub fn new_local_name(&mut self) -> u64 {
        let n = self.local_name_counter;
        self.local_name_counter += 1;
        n
    }

    /// Intern a literal constant.
    pub fn add_literal(&self, text: impl Into<String>, ty: Type) -> Value {
        Value::new(text.into(), ty, Storage::Literal)
    }

    /// Emit an implicit `alloca` slot, returning a [`Storage::StackSlot`]
    /// value addressing it. Callers are responsible for writing the actual
    /// `alloca` instruction via the emitter; this only mints the name.
    pub fn add_local(&mut self, name: &str, ty: Type) -> Value {
        Value::new(format!("%{}.addr", name), ty, Storage::StackSlot)
    }

    /// Record a global symbol. `defined` tracks whether this compilation unit
    /// provides a definition; globals that are referenced but never defined
    /// are emitted as `declare`s at module completion.
    pub fn add_global(&mut self, name: &str, ty: Type, defined: bool) -> Value {
        let v = Value::new(format!("@{}", name), ty, Storage::Global);
        self.globals.push(v.clone());
        if defined {
            self.undefined_globals.remove(name);
        } else {
            self.undefined_globals.insert(name.to_string());
        }
        v
    }

    /// Mark a previously-undefined global as now defined (a later
    /// declaration completing an earlier `extern`).
    pub fn mark_defined(&mut self, name: &str) {
        self.undefined_globals.remove(name);
    }

    /// Globals referenced but not defined, queried at end of compilation.
    pub fn undefined_globals(&self) -> impl Iterator<Item = &str> {
        self.undefined_globals.iter().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn temp_numbering_is_dense_and_resets_per_function() {
        let mut reg = ValueRegistry::new();
        let a = reg.new_temp(Type::int());
        let b = reg.new_temp(Type::int());
        assert_eq!(a.name, "%0");
        assert_eq!(b.name, "%1");
        reg.reset_function();
        let c = reg.new_temp(Type::int());
        assert_eq!(c.name, "%0");
    }

    #[test]
    fn undefined_globals_tracks_extern_without_definition() {
        let mut reg = ValueRegistry::new();
        reg.add_global("x", Type::int(), false);
        assert_eq!(reg.undefined_globals().collect::<Vec<_>>(), vec!["x"]);
        reg.mark_defined("x");
        assert!(reg.undefined_globals().next().is_none());
    }
}
