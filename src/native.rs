use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use libffi::middle::{Arg, Cif, CodePtr, Type};
use libloading::{Library, Symbol};
use tracing::debug;

use crate::{
    constants::MAX_CALL_ARGS,
    error::HeapError,
    value::{tagged::TaggedValue, view::RawView},
};

/// Runs the machine code at `code` as `extern "C" fn(isize, ...) -> isize`.
///
/// Arguments are tagged on the way in (pointers get the tag bit, integers are shifted with no
/// range check) and the returned word is decoded on the way out.
///
/// # Safety
///
/// `code` must point at executable code following the C calling convention for a function
/// taking `args.len()` word-sized integers and returning one. Whatever that code does to
/// memory is on the caller.
pub unsafe fn call(code: RawView, args: &[TaggedValue]) -> Result<TaggedValue, HeapError> {
    if args.len() > MAX_CALL_ARGS {
        return Err(HeapError::Arity(args.len()));
    }

    let words = args
        .iter()
        .map(|a| a.encode_unchecked().map(|w| w as isize))
        .collect::<Result<Vec<isize>, _>>()?;

    debug!("-- calling native code at {:p} with {:#x?} --", code.as_ptr(), words);

    let cif = Cif::new(words.iter().map(|_| Type::isize()), Type::isize());
    let arg_values: Vec<_> = words.iter().map(Arg::new).collect();
    let result: isize = unsafe { cif.call(CodePtr::from_ptr(code.as_code_ptr()), &arg_values) };

    let value = TaggedValue::decode_unchecked(result as usize);
    debug!("-- returning {value:?} --");
    Ok(value)
}

/// Loaded shared libraries, used to turn exported symbols into code views for [`call`].
pub struct NativeLibraries {
    root: Option<PathBuf>,
    libraries: HashMap<String, Library>,
}

impl NativeLibraries {
    /// Libraries are looked up in `root` first: the first file whose name starts with the
    /// requested name wins.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: Some(root.as_ref().to_path_buf()),
            libraries: HashMap::new(),
        }
    }

    /// Leaves library lookup to the platform loader.
    pub fn system() -> Self {
        Self {
            root: None,
            libraries: HashMap::new(),
        }
    }

    fn resolve_path(&self, name: &str) -> PathBuf {
        let Some(root) = &self.root else {
            return PathBuf::from(name);
        };
        let Ok(entries) = root.read_dir() else {
            return PathBuf::from(name);
        };
        entries
            .filter_map(|e| e.ok())
            .find(|e| e.file_name().to_string_lossy().starts_with(name))
            .map(|e| e.path())
            .unwrap_or_else(|| PathBuf::from(name))
    }

    pub fn get_library(&mut self, name: &str) -> Result<&Library, HeapError> {
        if !self.libraries.contains_key(name) {
            let path = self.resolve_path(name);
            debug!("loading native library {}", path.display());
            let library = unsafe { Library::new(&path) }.map_err(|e| HeapError::Library {
                name: name.to_string(),
                message: e.to_string(),
            })?;
            self.libraries.insert(name.to_string(), library);
        }
        Ok(&self.libraries[name])
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.libraries.contains_key(name)
    }

    /// Resolves `name` in `library` to a view of its code.
    pub fn get_function(&mut self, library: &str, name: &str) -> Result<RawView, HeapError> {
        let l = self.get_library(library)?;
        let sym: Symbol<unsafe extern "C" fn()> =
            unsafe { l.get(name.as_bytes()) }.map_err(|e| HeapError::Symbol {
                name: format!("{library}::{name}"),
                message: e.to_string(),
            })?;
        Ok(RawView::unknown(*sym as *mut u8))
    }
}
