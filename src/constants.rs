// Fixed parameters of the front end

/// Number of hash buckets in every scope
pub const HASH_SIZE: usize = 1049;

/// Widest operator spelling (`:=`, `<=`, `>=`, `<>`)
pub const MAX_OPERATOR_WIDTH: usize = 2;

/// Seed for the bucket hash
/// Fixed so that bucket placement is identical across runs
pub const HASH_SEED: u32 = 0x9747_b28c;

/// Joins a callable's base name to its type suffixes
/// Never valid inside an identifier
pub const MANGLE_SEPARATOR: char = '$';

/// Mangling suffix for a callable that takes no parameters
pub const VOID_SUFFIX: &str = "_v";

/// Prefix of compiler-generated temporaries (never entered into a scope)
pub const TEMP_PREFIX: &str = "_t";
