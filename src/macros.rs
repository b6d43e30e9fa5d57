//! Declarative macros shared across the crate.

/// Defines named tag-operation result codes together with a lookup function
/// resolving a code to its specific human-readable message.
///
/// Expands to one `pub const NAME: i32 = code;` per entry plus
/// `pub fn specific_message(code: i32) -> Option<&'static str>`.
#[macro_export]
macro_rules! define_tag_codes {
    ( $( $name:ident = $code:literal => $msg:expr ),+ $(,)? ) => {
        $( pub const $name: i32 = $code; )+

        /// Resolves a result code to its specific message, if one is known.
        pub fn specific_message(code: i32) -> Option<&'static str> {
            match code {
                $( $code => Some($msg), )+
                _ => None,
            }
        }
    };
}
