use crate::error::PluginError;
use crate::game::{Game, Snapshot};
use crate::strategy::Strategy;
use libloading::{Library, Symbol};
use std::ffi::CStr;
use std::os::raw::c_char;
use std::path::Path;

/// Symbol every plugin library must export
pub const CREATE_STRATEGY_SYMBOL: &[u8] = b"create_strategy";

/// FFI-safe representation of a strategy plugin.
///
/// The `Game` layout is shared as-is, so plugins must be built against the
/// same version of this crate as the harness.
#[repr(C)]
pub struct StrategyPlugin {
    pub strategy_ptr: *mut (),
    pub vtable: StrategyVTable,
}

/// Virtual table for strategy operations
#[repr(C)]
pub struct StrategyVTable {
    /// Nul-terminated display name with static lifetime
    pub name: unsafe extern "C" fn() -> *const c_char,
    /// Chosen column; negative values are treated as invalid moves
    pub decide: unsafe extern "C" fn(*const (), *const Game) -> i32,
    pub drop: unsafe extern "C" fn(*mut ()),
}

/// Type signature for the plugin creation function
pub type CreateStrategyFn = unsafe extern "C" fn() -> *mut StrategyPlugin;

/// Strategy loaded from a dynamic library
pub struct PluginStrategy {
    plugin: Box<StrategyPlugin>,
    name: String,
    _library: Option<Library>, // Keep library alive
}

impl PluginStrategy {
    /// Load a strategy plugin from a dynamic library file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PluginError> {
        let path = path.as_ref();
        unsafe {
            let library = Library::new(path).map_err(|source| PluginError::Load {
                path: path.to_path_buf(),
                source,
            })?;

            let plugin_ptr = {
                let create: Symbol<CreateStrategyFn> = library
                    .get(CREATE_STRATEGY_SYMBOL)
                    .map_err(PluginError::MissingSymbol)?;
                create()
            };

            Self::from_raw(plugin_ptr, Some(library))
        }
    }

    /// Take ownership of a plugin produced by a `create_strategy` function.
    ///
    /// # Safety
    ///
    /// `plugin_ptr` must be null or come from `Box::into_raw`, with a vtable
    /// valid for as long as `library` (if any) stays loaded.
    unsafe fn from_raw(
        plugin_ptr: *mut StrategyPlugin,
        library: Option<Library>,
    ) -> Result<Self, PluginError> {
        if plugin_ptr.is_null() {
            return Err(PluginError::NullPlugin);
        }
        let plugin = unsafe { Box::from_raw(plugin_ptr) };

        let name_ptr = unsafe { (plugin.vtable.name)() };
        let name = if name_ptr.is_null() {
            "Unknown".to_string()
        } else {
            unsafe { CStr::from_ptr(name_ptr) }
                .to_string_lossy()
                .into_owned()
        };

        Ok(PluginStrategy {
            plugin,
            name,
            _library: library,
        })
    }

    /// Display name reported by the plugin
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Strategy for PluginStrategy {
    fn decide(&self, snapshot: Snapshot) -> usize {
        let game: &Game = &snapshot;
        let column = unsafe { (self.plugin.vtable.decide)(self.plugin.strategy_ptr, game) };
        usize::try_from(column).unwrap_or(usize::MAX)
    }
}

impl Drop for PluginStrategy {
    fn drop(&mut self) {
        unsafe {
            (self.plugin.vtable.drop)(self.plugin.strategy_ptr);
        }
    }
}

// The exported vtable only reaches the strategy through `&self`, and the
// wrapped type is itself `Send + Sync` as required by `Strategy`.
unsafe impl Send for PluginStrategy {}
unsafe impl Sync for PluginStrategy {}

/// Export a `Strategy + Default` type from a `cdylib` crate.
///
/// ```ignore
/// connect_four_arena::export_strategy!(MyStrategy, "my strategy");
/// ```
#[macro_export]
macro_rules! export_strategy {
    ($strategy_type:ty, $name:literal) => {
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn create_strategy() -> *mut $crate::plugin::StrategyPlugin {
            let strategy = Box::new(<$strategy_type>::default());
            let strategy_ptr = Box::into_raw(strategy) as *mut ();

            let vtable = $crate::plugin::StrategyVTable {
                name: strategy_name,
                decide: strategy_decide,
                drop: strategy_drop,
            };

            Box::into_raw(Box::new($crate::plugin::StrategyPlugin {
                strategy_ptr,
                vtable,
            }))
        }

        unsafe extern "C" fn strategy_name() -> *const ::std::os::raw::c_char {
            concat!($name, "\0").as_ptr() as *const ::std::os::raw::c_char
        }

        unsafe extern "C" fn strategy_decide(
            ptr: *const (),
            game: *const $crate::game::Game,
        ) -> i32 {
            let strategy = unsafe { &*(ptr as *const $strategy_type) };
            let snapshot = unsafe { (*game).snapshot() };
            let column = $crate::strategy::Strategy::decide(strategy, snapshot);
            i32::try_from(column).unwrap_or(-1)
        }

        unsafe extern "C" fn strategy_drop(ptr: *mut ()) {
            let _ = unsafe { Box::from_raw(ptr as *mut $strategy_type) };
        }
    };
}
