//! Built-in PHP functions, language constructs and magic methods.
//!
//! Declared functions with one of these names are never harvested for
//! renaming. PHP function names are case-insensitive, so lookups lowercase
//! the candidate first. The table must stay sorted for the binary search.

pub const RESERVED_FUNCTIONS: &[&str] = &[
    "__autoload", "__call", "__callstatic", "__clone", "__construct", "__debuginfo",
    "__destruct", "__get", "__halt_compiler", "__invoke", "__isset", "__serialize", "__set",
    "__set_state", "__sleep", "__tostring", "__unserialize", "__unset", "__wakeup", "abs",
    "acos", "addslashes", "array", "array_change_key_case", "array_chunk", "array_column",
    "array_combine", "array_count_values", "array_diff", "array_diff_key", "array_fill",
    "array_fill_keys", "array_filter", "array_flip", "array_intersect", "array_intersect_key",
    "array_key_exists", "array_key_first", "array_key_last", "array_keys", "array_map",
    "array_merge", "array_merge_recursive", "array_pad", "array_pop", "array_product",
    "array_push", "array_rand", "array_reduce", "array_replace", "array_reverse",
    "array_search", "array_shift", "array_slice", "array_splice", "array_sum", "array_unique",
    "array_unshift", "array_values", "array_walk", "arsort", "asort", "assert", "base64_decode",
    "base64_encode", "basename", "bin2hex", "call_user_func", "call_user_func_array", "ceil",
    "chdir", "checkdate", "chmod", "chr", "class_exists", "clearstatcache", "closedir",
    "compact", "constant", "copy", "cos", "count", "crc32", "ctype_alnum", "ctype_alpha",
    "ctype_digit", "ctype_space", "current", "date", "date_default_timezone_set",
    "debug_backtrace", "declare", "define", "defined", "die", "dirname", "each", "echo",
    "empty", "end", "error_log", "error_reporting", "escapeshellarg", "eval", "exec", "exit",
    "explode", "extract", "fclose", "feof", "fflush", "fgetcsv", "fgets", "file", "file_exists",
    "file_get_contents", "file_put_contents", "filemtime", "filesize", "filter_var", "floatval",
    "flock", "floor", "flush", "fopen", "fputcsv", "fputs", "fread", "fseek", "ftell",
    "func_get_args", "func_num_args", "function_exists", "fwrite", "get_class",
    "get_object_vars", "get_parent_class", "getcwd", "getenv", "gettype", "glob", "gmdate",
    "hash", "hash_hmac", "header", "headers_sent", "hexdec", "html_entity_decode",
    "htmlentities", "htmlspecialchars", "http_build_query", "iconv", "implode", "in_array",
    "include", "include_once", "ini_get", "ini_set", "intdiv", "intval", "is_array", "is_bool",
    "is_callable", "is_dir", "is_file", "is_float", "is_int", "is_numeric", "is_object",
    "is_readable", "is_resource", "is_string", "is_writable", "isset", "join", "json_decode",
    "json_encode", "key", "krsort", "ksort", "lcfirst", "list", "ltrim", "mail", "max",
    "mb_strlen", "mb_strtolower", "mb_strtoupper", "mb_substr", "md5", "method_exists",
    "microtime", "min", "mkdir", "mktime", "mt_rand", "nl2br", "number_format", "ob_end_clean",
    "ob_get_clean", "ob_start", "opendir", "parse_str", "parse_url", "pathinfo",
    "php_sapi_name", "phpinfo", "phpversion", "pow", "preg_match", "preg_match_all",
    "preg_quote", "preg_replace", "preg_replace_callback", "preg_split", "print", "print_r",
    "printf", "property_exists", "rand", "random_int", "range", "rawurlencode", "readdir",
    "readfile", "realpath", "register_shutdown_function", "rename", "require", "require_once",
    "reset", "return", "rmdir", "round", "rsort", "rtrim", "scandir", "serialize",
    "session_destroy", "session_id", "session_start", "set_error_handler",
    "set_exception_handler", "setcookie", "settype", "sha1", "shuffle", "sin", "sizeof",
    "sleep", "sort", "spl_autoload_register", "sprintf", "sqrt", "str_contains",
    "str_ends_with", "str_pad", "str_repeat", "str_replace", "str_split", "str_starts_with",
    "strcasecmp", "strcmp", "strip_tags", "stripslashes", "stristr", "strlen", "strncmp",
    "strpos", "strrev", "strrpos", "strstr", "strtolower", "strtotime", "strtoupper", "strval",
    "substr", "substr_count", "substr_replace", "tan", "tempnam", "time", "tmpfile",
    "trigger_error", "trim", "uasort", "ucfirst", "ucwords", "uksort", "uniqid", "unlink",
    "unserialize", "unset", "urldecode", "urlencode", "usleep", "usort", "var_dump",
    "var_export", "version_compare", "vsprintf", "wordwrap",
];

/// True when `name` is a built-in that must keep its name.
pub fn is_reserved(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    RESERVED_FUNCTIONS
        .binary_search(&lower.as_str())
        .is_ok()
}
