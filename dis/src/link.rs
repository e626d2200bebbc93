use std::{fmt, sync::Arc};

use log::{debug, warn};

use crate::{Dispatch, ModuleImage, ModuleKind, Sig, TypeDesc};

/// One ordered import request declared by a caller module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub name: String,
    pub sig: Sig,
}

impl Import {
    pub fn new(name: &str, sig: Sig) -> Self {
        Self {
            name: name.to_string(),
            sig,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The provider exports no symbol of this name.
    Unresolved { module: Arc<str>, symbol: String },
    /// The name matched but the checksums differ; guards against
    /// ABI-incompatible relinks after a module changes.
    TypeMismatch {
        module: Arc<str>,
        symbol: String,
        want: Sig,
        found: Sig,
    },
    /// The host allocator refused the link table.
    Alloc,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Unresolved { module, symbol } => {
                write!(f, "link failed fn {module}->{symbol}() not implemented")
            }
            LinkError::TypeMismatch {
                module,
                symbol,
                want,
                found,
            } => {
                write!(
                    f,
                    "link typecheck {module}->{symbol}() {:#x}/{:#x}",
                    found.0, want.0
                )
            }
            LinkError::Alloc => write!(f, "link allocation failed"),
        }
    }
}

impl std::error::Error for LinkError {}

/// One resolved slot of a link table. Holds its own name reference, so
/// teardown never has to reason about who owns the string.
#[derive(Debug, Clone)]
pub struct ResolvedLink {
    pub name: Arc<str>,
    pub sig: Sig,
    pub dispatch: Dispatch,
    pub frame: Option<Arc<TypeDesc>>,
}

/// Per-instance copy of a module's global data area.
#[derive(Debug)]
pub struct InstanceData {
    bytes: Box<[u8]>,
}

impl InstanceData {
    fn zeroed(size: usize) -> Self {
        Self {
            bytes: vec![0; size].into_boxed_slice(),
        }
    }

    /// Copy-initialize from the module's prototype, zero-filling any
    /// tail the prototype does not cover.
    fn from_prototype(proto: &[u8], size: usize) -> Self {
        let mut bytes = vec![0; size];
        let n = proto.len().min(size);
        bytes[..n].copy_from_slice(&proto[..n]);
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A module's imports resolved against a provider, ready to call.
///
/// Shared by cloning the `Arc`: each interpreter process that holds a
/// reference keeps the link table alive, and the table plus any instance
/// data are torn down exactly once when the last reference drops. The
/// backing image is owned by the registry/caller and survives the link.
#[derive(Debug)]
pub struct LinkedModule {
    pub image: Arc<ModuleImage>,
    pub links: Box<[ResolvedLink]>,
    pub data: Option<InstanceData>,
}

/// Resolves `imports` in order against `image`'s export table.
///
/// All-or-nothing: any failure drops the partially built module and
/// returns the error, so a partial link table never escapes. The image
/// and its export table are never mutated.
pub fn link(
    image: &Arc<ModuleImage>,
    imports: &[Import],
    instantiate: bool,
) -> Result<Arc<LinkedModule>, LinkError> {
    let mut links = Vec::new();
    links
        .try_reserve_exact(imports.len())
        .map_err(|_| LinkError::Alloc)?;

    let data = if instantiate {
        instance_data(image)
    } else {
        None
    };

    for import in imports {
        let found = image.exports.find(&import.name).ok_or_else(|| {
            let err = LinkError::Unresolved {
                module: image.name.clone(),
                symbol: import.name.clone(),
            };
            warn!("{err}");
            err
        })?;
        if found.sig != import.sig {
            let err = LinkError::TypeMismatch {
                module: image.name.clone(),
                symbol: import.name.clone(),
                want: import.sig,
                found: found.sig,
            };
            warn!("{err}");
            return Err(err);
        }
        debug!(
            "link {}->{}() sig {:#x}",
            image.name, import.name, import.sig.0
        );
        links.push(ResolvedLink {
            name: found.name.clone(),
            sig: found.sig,
            dispatch: found.dispatch,
            frame: found.frame.clone(),
        });
    }

    Ok(Arc::new(LinkedModule {
        image: Arc::clone(image),
        links: links.into_boxed_slice(),
        data,
    }))
}

/// Fresh instance data for one link: dynamic modules get a zeroed block,
/// builtins a copy of their data prototype. Modules without a prototype
/// or type descriptor get none.
fn instance_data(image: &ModuleImage) -> Option<InstanceData> {
    match image.kind {
        ModuleKind::Dyn => image
            .types
            .first()
            .map(|t| InstanceData::zeroed(t.size)),
        ModuleKind::Builtin => match (&image.origmp, image.types.first()) {
            (Some(proto), Some(t)) if !proto.is_empty() => {
                Some(InstanceData::from_prototype(proto, t.size))
            }
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExecState, ExportTable, ModuleImageCreateInfo, ValueKind, sig_of};

    fn add(state: &mut ExecState) {
        let b = state.pop().unwrap();
        let a = state.pop().unwrap();
        state.push(a + b);
    }

    fn neg(state: &mut ExecState) {
        let a = state.pop().unwrap();
        state.push(-a);
    }

    fn binary_sig() -> Sig {
        sig_of(&[ValueKind::Word, ValueKind::Word], &[ValueKind::Word])
    }

    fn unary_sig() -> Sig {
        sig_of(&[ValueKind::Word], &[ValueKind::Word])
    }

    fn math_image(origmp: Option<Box<[u8]>>) -> Arc<ModuleImage> {
        let mut exports = ExportTable::new();
        exports.runtime("add", binary_sig(), add, None);
        exports.runtime("neg", unary_sig(), neg, None);
        exports.prog("entry", unary_sig(), 4, Some(Arc::new(TypeDesc { size: 24 })));
        ModuleImage::builtin(
            ModuleImageCreateInfo {
                name: "math".to_string(),
                path: "/dis/math.dis".to_string(),
                types: vec![Arc::new(TypeDesc { size: 8 })],
                origmp,
            },
            exports,
        )
    }

    #[test]
    fn resolves_in_request_order() {
        let image = math_image(None);
        let imports = [
            Import::new("neg", unary_sig()),
            Import::new("add", binary_sig()),
            Import::new("entry", unary_sig()),
        ];

        let linked = link(&image, &imports, false).unwrap();
        assert_eq!(linked.links.len(), imports.len());
        for (slot, import) in linked.links.iter().zip(&imports) {
            assert_eq!(&*slot.name, import.name);
            assert_eq!(slot.sig, import.sig);
        }
        assert!(matches!(linked.links[2].dispatch, Dispatch::Prog(4)));
        assert_eq!(linked.links[2].frame.as_ref().unwrap().size, 24);

        // Same inputs, same table.
        let again = link(&image, &imports, false).unwrap();
        for (a, b) in linked.links.iter().zip(again.links.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.sig, b.sig);
        }
    }

    #[test]
    fn unresolved_symbol() {
        let image = math_image(None);
        let imports = [Import::new("missing", unary_sig())];
        let err = link(&image, &imports, false).unwrap_err();
        assert_eq!(
            err,
            LinkError::Unresolved {
                module: image.name.clone(),
                symbol: "missing".to_string(),
            }
        );
    }

    #[test]
    fn signature_mismatch_is_distinct_from_unresolved() {
        let image = math_image(None);
        let imports = [Import::new("add", unary_sig())];
        let err = link(&image, &imports, false).unwrap_err();
        assert_eq!(
            err,
            LinkError::TypeMismatch {
                module: image.name.clone(),
                symbol: "add".to_string(),
                want: unary_sig(),
                found: binary_sig(),
            }
        );
    }

    #[test]
    fn failure_drops_partial_table() {
        let image = math_image(Some(vec![1, 2, 3].into_boxed_slice()));
        // Two good slots, then a failure.
        let imports = [
            Import::new("add", binary_sig()),
            Import::new("neg", unary_sig()),
            Import::new("missing", unary_sig()),
        ];
        assert!(link(&image, &imports, true).is_err());
        // Nothing kept a reference to the image beyond ours.
        assert_eq!(Arc::strong_count(&image), 1);
    }

    #[test]
    fn teardown_runs_once_at_last_release() {
        let image = math_image(Some(vec![7; 8].into_boxed_slice()));
        let imports = [Import::new("add", binary_sig())];

        for n in 1..4usize {
            let linked = link(&image, &imports, true).unwrap();
            let weak = Arc::downgrade(&linked);
            let retained: Vec<_> = (0..n).map(|_| Arc::clone(&linked)).collect();

            drop(linked);
            assert!(weak.upgrade().is_some(), "released too early at n={n}");
            drop(retained);
            assert!(weak.upgrade().is_none(), "not released at n={n}");
        }
        assert_eq!(Arc::strong_count(&image), 1);
    }

    #[test]
    fn instance_data_copies_prototype() {
        let image = math_image(Some(vec![1, 2, 3, 4].into_boxed_slice()));
        let imports = [Import::new("add", binary_sig())];

        let linked = link(&image, &imports, true).unwrap();
        let data = linked.data.as_ref().unwrap();
        assert_eq!(data.len(), 8);
        assert_eq!(data.bytes(), &[1, 2, 3, 4, 0, 0, 0, 0]);

        // Each instantiation gets its own copy.
        let sibling = link(&image, &imports, true).unwrap();
        assert!(!std::ptr::eq(
            data.bytes().as_ptr(),
            sibling.data.as_ref().unwrap().bytes().as_ptr()
        ));

        let bare = link(&image, &imports, false).unwrap();
        assert!(bare.data.is_none());
    }

    #[test]
    fn dynamic_module_gets_zeroed_data() {
        let mut exports = ExportTable::new();
        exports.prog("init", unary_sig(), 0, None);
        let image = ModuleImage::dynamic(
            ModuleImageCreateInfo {
                name: "ext".to_string(),
                path: "/dis/ext.dis".to_string(),
                types: vec![Arc::new(TypeDesc { size: 16 })],
                origmp: None,
            },
            exports,
        );

        let linked = link(&image, &[Import::new("init", unary_sig())], true).unwrap();
        let data = linked.data.as_ref().unwrap();
        assert_eq!(data.len(), 16);
        assert!(data.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn no_prototype_means_no_data() {
        let image = math_image(None);
        let linked = link(&image, &[Import::new("add", binary_sig())], true).unwrap();
        assert!(linked.data.is_none());
    }

    #[test]
    fn call_through_resolved_slot() {
        let image = math_image(None);
        let imports = [
            Import::new("add", binary_sig()),
            Import::new("neg", unary_sig()),
        ];
        let linked = link(&image, &imports, false).unwrap();

        let mut state = ExecState::new(&Default::default());
        state.push(5);
        state.push(77);
        for slot in &linked.links {
            if let Dispatch::Native(f) = slot.dispatch {
                f(&mut state);
            }
        }
        assert_eq!(state.pop(), Some(-82));
    }

    #[test]
    fn concurrent_links_share_one_image() {
        use std::thread;

        let image = math_image(Some(vec![9; 4].into_boxed_slice()));
        let imports = [
            Import::new("add", binary_sig()),
            Import::new("neg", unary_sig()),
        ];

        let mut joins = Vec::new();
        for _ in 0..8 {
            let image = Arc::clone(&image);
            let imports = imports.clone();
            joins.push(thread::spawn(move || {
                let linked = link(&image, &imports, true).unwrap();
                assert_eq!(linked.links.len(), 2);
                assert_eq!(linked.data.as_ref().unwrap().bytes()[0], 9);
            }));
        }
        for j in joins {
            j.join().unwrap();
        }
        assert_eq!(Arc::strong_count(&image), 1);
    }

    #[test]
    fn shadowed_export_resolves_to_first() {
        let mut exports = ExportTable::new();
        exports.runtime("f", unary_sig(), neg, None);
        exports.prog("f", unary_sig(), 12, None);
        let image = ModuleImage::builtin(
            ModuleImageCreateInfo {
                name: "shadow".to_string(),
                ..Default::default()
            },
            exports,
        );

        let linked = link(&image, &[Import::new("f", unary_sig())], false).unwrap();
        assert!(matches!(linked.links[0].dispatch, Dispatch::Native(_)));
    }
}
