//! The core host function API.
//!
//! These are the native functions the self-hosted Zeta sources build on.
//! Each is registered under its plain name with its signature string;
//! runtime initialization rebinds every entry in the Zeta global scope as
//! `$name`. Signatures outside the four forms the call bridge dispatches
//! (`bool(tag)`, `void(int)`, `void(int64)`, `void(string)`) register as
//! unsupported: the binding exists, calling it is fatal.

use zeta_util::Result;
use zeta_vm::{HostFnId, HostSig, Tag, Vm};

fn is_int64(tag: Tag) -> bool {
    tag == Tag::Int64
}

fn is_string(tag: Tag) -> bool {
    tag == Tag::String
}

fn print_int64(val: i64) {
    print!("{val}");
}

fn print_string(text: &str) {
    print!("{text}");
}

fn exit(code: i32) {
    std::process::exit(code);
}

/// Register the core host functions, returning their records in
/// registration order.
pub fn init_api_core(vm: &mut Vm) -> Result<Vec<HostFnId>> {
    let mut fns = Vec::new();

    // Type tests
    fns.push(vm.register_hostfn("is_int64", "bool(tag)", HostSig::BoolTag(is_int64))?);
    fns.push(vm.register_hostfn("is_string", "bool(tag)", HostSig::BoolTag(is_string))?);

    // Basic string I/O
    fns.push(vm.register_hostfn("print_int64", "void(int64)", HostSig::VoidInt64(print_int64))?);
    fns.push(vm.register_hostfn("print_string", "void(string)", HostSig::VoidStr(print_string))?);
    fns.push(vm.register_hostfn("read_line", "char*()", HostSig::Unsupported)?);
    fns.push(vm.register_hostfn("read_file", "char*(char*)", HostSig::Unsupported)?);

    // Allocation and process control
    fns.push(vm.register_hostfn("malloc", "void*(size_t)", HostSig::Unsupported)?);
    fns.push(vm.register_hostfn("free", "void(void*)", HostSig::Unsupported)?);
    fns.push(vm.register_hostfn("exit", "void(int)", HostSig::VoidInt(exit))?);

    Ok(fns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names_and_signatures() {
        let mut vm = Vm::new();
        let fns = init_api_core(&mut vm).unwrap();
        assert_eq!(fns.len(), 9);

        let names: Vec<_> = fns
            .iter()
            .map(|&id| vm.interner.resolve(vm.heap.hostfn(id).name).to_string())
            .collect();
        assert_eq!(
            names,
            [
                "is_int64",
                "is_string",
                "print_int64",
                "print_string",
                "read_line",
                "read_file",
                "malloc",
                "free",
                "exit"
            ]
        );

        let sig = vm.heap.hostfn(fns[0]).sig_str;
        assert_eq!(vm.interner.resolve(sig), "bool(tag)");
    }

    #[test]
    fn test_type_test_predicates() {
        assert!(is_int64(Tag::Int64));
        assert!(!is_int64(Tag::String));
        assert!(is_string(Tag::String));
        assert!(!is_string(Tag::Bool));
    }

    #[test]
    fn test_signature_strings_are_interned() {
        let mut vm = Vm::new();
        let fns = init_api_core(&mut vm).unwrap();
        // Both type tests share one interned signature string.
        let a = vm.heap.hostfn(fns[0]).sig_str;
        let b = vm.heap.hostfn(fns[1]).sig_str;
        assert_eq!(a, b);
    }
}
