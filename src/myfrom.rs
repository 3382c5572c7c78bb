//! Conversions into `KString` for the generic name and text
//! parameters of the tree API.

use std::borrow::Cow;

use kstring::KString;

// A separate trait because `From` can't be extended for KString here.
pub trait MyFrom<T> {
    fn myfrom(s: T) -> Self;
}

// No `from_static`: `&'static str` can't get its own impl.
impl MyFrom<&str> for KString {
    fn myfrom(s: &str) -> Self {
        KString::from_ref(s)
    }
}

impl MyFrom<&String> for KString {
    fn myfrom(s: &String) -> Self {
        KString::from_ref(s)
    }
}

impl MyFrom<String> for KString {
    fn myfrom(s: String) -> Self {
        KString::from_string(s)
    }
}

impl MyFrom<&KString> for KString {
    fn myfrom(s: &KString) -> Self {
        s.clone()
    }
}

impl MyFrom<KString> for KString {
    fn myfrom(s: KString) -> Self {
        s
    }
}

impl<'t> MyFrom<Cow<'t, str>> for KString {
    fn myfrom(s: Cow<'t, str>) -> Self {
        match s {
            Cow::Borrowed(s) => KString::from_ref(s),
            Cow::Owned(s) => KString::from_string(s),
        }
    }
}

pub fn ks<T>(s: T) -> KString
where KString: MyFrom<T>
{
    KString::myfrom(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_ks() {
        let owned = String::from("b");
        assert_eq!(ks("a").as_str(), "a");
        assert_eq!(ks(&owned).as_str(), "b");
        assert_eq!(ks(Cow::Borrowed("c")).as_str(), "c");
        assert_eq!(ks(ks("d")).as_str(), "d");
    }
}
