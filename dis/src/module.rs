use std::sync::Arc;

use crate::{ExecState, Sig};

/// Frame or data layout descriptor for a linked symbol's activation
/// record, or for a module's instance data area (`types[0]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDesc {
    pub size: usize,
}

/// Host runtime function shape.
pub type NativeFn = fn(&mut ExecState);

/// Where a resolved call lands: a host function or a bytecode address.
#[derive(Debug, Clone, Copy)]
pub enum Dispatch {
    Native(NativeFn),
    Prog(usize),
}

/// One exported symbol. The name is always an owned copy, whichever
/// registration path produced the entry.
#[derive(Debug, Clone)]
pub struct Export {
    pub name: Arc<str>,
    pub sig: Sig,
    pub dispatch: Dispatch,
    pub frame: Option<Arc<TypeDesc>>,
}

/// A module's export table. Append-only; registration never rejects a
/// duplicate name.
#[derive(Debug, Default)]
pub struct ExportTable {
    entries: Vec<Export>,
}

impl ExportTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a host-provided native symbol.
    pub fn runtime(&mut self, name: &str, sig: Sig, func: NativeFn, frame: Option<Arc<TypeDesc>>) {
        self.entries.push(Export {
            name: Arc::from(name),
            sig,
            dispatch: Dispatch::Native(func),
            frame,
        });
    }

    /// Register a symbol implemented at a bytecode address.
    pub fn prog(&mut self, name: &str, sig: Sig, pc: usize, frame: Option<Arc<TypeDesc>>) {
        self.entries.push(Export {
            name: Arc::from(name),
            sig,
            dispatch: Dispatch::Prog(pc),
            frame,
        });
    }

    /// Linear scan, first match wins. Duplicate names shadow by
    /// insertion order; nothing validates against them at registration.
    pub fn find(&self, name: &str) -> Option<&Export> {
        self.entries.iter().find(|e| &*e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Export> {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// Compiled into the host.
    Builtin,
    /// Loaded dynamically at runtime.
    Dyn,
}

/// A parsed bytecode unit: name, export table, type descriptors, and the
/// prototype of its global data area. Immutable once constructed, so
/// concurrent links against one shared image are safe.
#[derive(Debug)]
pub struct ModuleImage {
    pub name: Arc<str>,
    pub path: String,
    pub kind: ModuleKind,
    pub exports: ExportTable,
    pub types: Vec<Arc<TypeDesc>>,
    pub origmp: Option<Box<[u8]>>,
}

#[derive(Debug, Default)]
pub struct ModuleImageCreateInfo {
    pub name: String,
    pub path: String,
    pub types: Vec<Arc<TypeDesc>>,
    pub origmp: Option<Box<[u8]>>,
}

impl ModuleImage {
    pub fn builtin(info: ModuleImageCreateInfo, exports: ExportTable) -> Arc<Self> {
        Self::new(info, ModuleKind::Builtin, exports)
    }

    pub fn dynamic(info: ModuleImageCreateInfo, exports: ExportTable) -> Arc<Self> {
        Self::new(info, ModuleKind::Dyn, exports)
    }

    fn new(info: ModuleImageCreateInfo, kind: ModuleKind, exports: ExportTable) -> Arc<Self> {
        Arc::new(Self {
            name: Arc::from(info.name.as_str()),
            path: info.path,
            kind,
            exports,
            types: info.types,
            origmp: info.origmp,
        })
    }
}
