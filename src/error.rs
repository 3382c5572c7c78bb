//! Typed tree errors, boxed so that `Result<T, TreeError>` stays a
//! single pointer wide. Library functions return `anyhow::Result`;
//! wrap kinds with `tree_error` and let callers `downcast_ref`.

use kstring::KString;

/// Define an error type wrapper e.g. `Foo` around a
/// `Box<FooKind>`. Implements `std::error::Error`, `Deref` and `From`
/// on `Foo` so the underlying `FooKind` stays accessible; thanks to
/// the `From` forwarding, `thiserror`'s `#[from]` still works.
#[macro_export]
macro_rules! def_boxed_error {
    ($wrappername:ident, $kindname:ident) => {

        #[derive(Debug)]
        pub struct $wrappername(Box<$kindname>);

        impl std::ops::Deref for $wrappername {
            type Target = $kindname;

            fn deref(&self) -> &Self::Target {
                &*self.0
            }
        }

        impl<E> From<E> for $wrappername where $kindname: From<E> {
            fn from(err: E) -> Self {
                $wrappername(Box::new($kindname::from(err)))
            }
        }

        impl std::error::Error for $wrappername {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                self.0.source()
            }
        }

        impl std::fmt::Display for $wrappername {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                // The method call syntax is ambiguous here
                std::fmt::Display::fmt(&*self.0, f)
            }
        }
    }
}

/// Defines both an error kind (deriving `thiserror::Error`) and its
/// box wrapper as per `def_boxed_error`.
#[macro_export]
macro_rules! def_boxed_thiserror {
    ($wrappername:ident, $key1:tt $kindname:ident {$($body:tt)*}) => {
        $crate::_def_boxed_thiserror!($wrappername, $kindname, $key1 $kindname {
            $($body)*
        });
    };
    ($wrappername:ident, $key1:tt $key2:tt $kindname:ident {$($body:tt)*}) => {
        $crate::_def_boxed_thiserror!($wrappername, $kindname, $key1 $key2 $kindname {
            $($body)*
        });
    };
}

#[macro_export]
macro_rules! _def_boxed_thiserror {
    (
        $wrappername:ident,
        $kindname:ident,
        $($innerdef:tt)*
    ) => {
        #[derive(thiserror::Error, Debug)]
        $($innerdef)*

        $crate::def_boxed_error!($wrappername, $kindname);
    }
}

def_boxed_thiserror!(TreeError, pub enum TreeErrorKind {
    #[error("{0} resolved without a resolution context")]
    NoContext(String),
    #[error("attribute {name:?}: can't store a {capability} value")]
    UnsupportedAttributeValue { name: KString, capability: &'static str },
    #[error("no render handler registered for foreign value of type {0}")]
    UnhandledForeign(&'static str),
    #[error("lazy value still unresolved after {0} unwinding steps")]
    UnwindLimit(usize),
    #[error("{0} is not a node of kind {1}")]
    NotANode(String, &'static str),
    #[error("HtmlAllocator: out of memory")]
    OutOfMemory,
    #[error("invalid id {0}")]
    InvalidId(String),
    #[error("setter {setter:?}: {message}")]
    BadSetterValue { setter: &'static str, message: String },
    #[error("a {0} value can't be rendered")]
    Unrenderable(&'static str),
});

pub fn tree_error(kind: TreeErrorKind) -> anyhow::Error {
    anyhow::Error::new(TreeError::from(kind))
}

/// The kind of `e` if it is (or wraps) a `TreeError`.
pub fn tree_error_kind(e: &anyhow::Error) -> Option<&TreeErrorKind> {
    e.downcast_ref::<TreeError>().map(|e| &**e)
}
