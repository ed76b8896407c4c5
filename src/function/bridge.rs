//! Function registration and the generic call path.

use std::fmt;
use std::sync::Arc;

use autobind_core::{Host, StackIndex, TypeId};
use tracing::{debug, trace, warn};

use crate::error::{BridgeError, Result};
use crate::registry::Registry;

use super::thunk::{FnAddr, NativeFunction, Thunk, ThunkFrame, TypedThunk};

/// Everything needed to call one registered function.
#[derive(Clone)]
pub struct FunctionDescriptor {
    address: FnAddr,
    thunk: Arc<dyn Thunk + Send + Sync>,
    name: Option<String>,
    return_type: TypeId,
    arg_types: Vec<TypeId>,
    arg_sizes: Vec<usize>,
    return_size: usize,
}

impl FunctionDescriptor {
    pub fn address(&self) -> FnAddr {
        self.address
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn return_type(&self) -> TypeId {
        self.return_type
    }

    pub fn arg_types(&self) -> &[TypeId] {
        &self.arg_types
    }

    pub fn arg_sizes(&self) -> &[usize] {
        &self.arg_sizes
    }

    pub fn return_size(&self) -> usize {
        self.return_size
    }

    /// Summed size of all arguments.
    pub fn args_size(&self) -> usize {
        self.arg_sizes.iter().sum()
    }

    /// Name if registered with one, address otherwise.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.address.to_string(),
        }
    }
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("address", &self.address)
            .field("name", &self.name)
            .field("return_type", &self.return_type)
            .field("arg_types", &self.arg_types)
            .field("arg_sizes", &self.arg_sizes)
            .field("return_size", &self.return_size)
            .finish_non_exhaustive()
    }
}

impl Registry {
    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a function by address with an explicit thunk and signature.
    ///
    /// Re-registering an address or a name replaces the earlier entry.
    pub fn register_function<T>(
        &mut self,
        address: FnAddr,
        thunk: T,
        name: Option<&str>,
        return_type: TypeId,
        arg_types: &[TypeId],
    ) -> Result<()>
    where
        T: Thunk + Send + Sync + 'static,
    {
        let label = name.map_or_else(|| address.to_string(), str::to_string);

        let return_size = self.type_size(return_type)?;
        let arg_sizes = arg_types
            .iter()
            .map(|&id| self.type_size(id))
            .collect::<Result<Vec<_>>>()?;

        let config = *self.config();
        let args_size: usize = arg_sizes.iter().sum();
        if args_size > config.argument_capacity {
            return Err(BridgeError::CapacityExceeded {
                function: label,
                what: "arguments",
                required: args_size,
                capacity: config.argument_capacity,
            });
        }
        if return_size > config.return_capacity {
            return Err(BridgeError::CapacityExceeded {
                function: label,
                what: "return value",
                required: return_size,
                capacity: config.return_capacity,
            });
        }

        let descriptor = FunctionDescriptor {
            address,
            thunk: Arc::new(thunk),
            name: name.map(str::to_string),
            return_type,
            arg_types: arg_types.to_vec(),
            arg_sizes,
            return_size,
        };

        if let Some(old) = self.functions.insert(address, descriptor) {
            warn!(function = %label, address = %address, "replaced function at address");
            if let Some(old_name) = old.name {
                if self.function_names.get(&old_name) == Some(&address) {
                    self.function_names.remove(&old_name);
                }
            }
        }
        if let Some(name) = name {
            if let Some(previous) = self.function_names.insert(name.to_string(), address) {
                if previous != address {
                    warn!(function = name, previous = %previous, "rebound function name");
                }
            }
        }

        debug!(
            function = %label,
            address = %address,
            args = arg_types.len(),
            args_size,
            return_size,
            "registered function"
        );
        Ok(())
    }

    /// Register a typed `fn` pointer, deriving its thunk and signature.
    ///
    /// Every parameter and result type must already be registered under its
    /// [`NativeValue::TYPE_NAME`](autobind_core::NativeValue::TYPE_NAME); the
    /// built-in scalars always are. Returns the address to call it by.
    pub fn register_fn<F: NativeFunction>(&mut self, f: F, name: Option<&str>) -> Result<FnAddr> {
        let return_type = self.resolve_native_name(F::return_type_name())?;
        let arg_types = F::arg_type_names()
            .into_iter()
            .map(|type_name| self.resolve_native_name(type_name))
            .collect::<Result<Vec<_>>>()?;

        let address = f.address();
        self.register_function(address, TypedThunk(f), name, return_type, &arg_types)?;
        Ok(address)
    }

    fn resolve_native_name(&self, type_name: &str) -> Result<TypeId> {
        let id = self.find_type(type_name);
        self.type_entry(id)?;
        Ok(id)
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    pub fn has_function(&self, address: FnAddr) -> bool {
        self.functions.contains_key(&address)
    }

    pub fn has_function_name(&self, name: &str) -> bool {
        self.function_names.contains_key(name)
    }

    pub fn function(&self, address: FnAddr) -> Option<&FunctionDescriptor> {
        self.functions.get(&address)
    }

    pub fn function_by_name(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.function_names
            .get(name)
            .and_then(|address| self.functions.get(address))
    }

    // ==========================================================================
    // Calls
    // ==========================================================================

    /// Call the function registered at `address` with arguments taken from
    /// the top of the host stack.
    ///
    /// The last argument is the top value. On success the arguments are
    /// popped and the result pushed; the pushed count is returned (0 for
    /// `void`). If argument conversion or the thunk fails, the stack is left
    /// as it was.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn call(&self, host: &mut dyn Host, address: FnAddr) -> Result<usize> {
        let function = self
            .functions
            .get(&address)
            .ok_or_else(|| BridgeError::UnknownFunction {
                function: address.to_string(),
            })?;
        self.invoke(host, function)
    }

    /// Call the function registered under `name`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn call_by_name(&self, host: &mut dyn Host, name: &str) -> Result<usize> {
        let function = self
            .function_by_name(name)
            .ok_or_else(|| BridgeError::UnknownFunction {
                function: format!("'{name}'"),
            })?;
        self.invoke(host, function)
    }

    /// Like [`Registry::call`], but reports failure through
    /// [`Host::raise_error`] and returns 0.
    pub fn call_raising(&self, host: &mut dyn Host, address: FnAddr) -> usize {
        let result = self.call(host, address);
        raise_on_error(host, result)
    }

    /// Like [`Registry::call_by_name`], but reports failure through
    /// [`Host::raise_error`] and returns 0.
    pub fn call_by_name_raising(&self, host: &mut dyn Host, name: &str) -> usize {
        let result = self.call_by_name(host, name);
        raise_on_error(host, result)
    }

    fn invoke(&self, host: &mut dyn Host, function: &FunctionDescriptor) -> Result<usize> {
        let argc = function.arg_types.len();
        let available = host.stack_size();
        if available < argc {
            return Err(BridgeError::ArgumentCount {
                function: function.display_name(),
                expected: argc,
                actual: available,
            });
        }
        trace!(function = %function.display_name(), argc, "call");

        let arena = self.scratch.take();
        let args = arena.alloc_slice_fill_copy(function.args_size(), 0u8);
        let ret = arena.alloc_slice_fill_copy(function.return_size, 0u8);

        // Absolute index of the first argument.
        let base = (available - argc) as StackIndex + 1;
        let mut offset = 0;
        for (i, (&arg_type, &size)) in function
            .arg_types
            .iter()
            .zip(&function.arg_sizes)
            .enumerate()
        {
            let slot = &mut args[offset..offset + size];
            self.read(host, arg_type, slot, base + i as StackIndex)?;
            offset += size;
        }

        let mut frame = ThunkFrame::new(args, &function.arg_sizes, &mut *ret, function.address);
        function.thunk.call(&mut frame)?;

        host.pop(argc);
        if function.return_type == self.void_type {
            return Ok(0);
        }
        self.push(host, function.return_type, ret)
    }
}

fn raise_on_error(host: &mut dyn Host, result: Result<usize>) -> usize {
    match result {
        Ok(pushed) => pushed,
        Err(err) => {
            debug!(error = %err, kind = ?err.kind(), "call failed, raising on host");
            host.raise_error(err.to_string());
            0
        }
    }
}
