//! Shorthands for `HtmlAllocator::element`, one per tag:
//! `html.ul([att("class", "menu"), "first".into()])`.

use anyhow::Result;

use crate::{allocator::{AId, HtmlAllocator},
            node::Node,
            value::ToArgs};

macro_rules! def_elements {
    ($($method:ident $tag:literal)*) => {
        impl HtmlAllocator {
            $(
                #[inline]
                pub fn $method(&self, args: impl ToArgs) -> Result<AId<Node>> {
                    self.element($tag, args)
                }
            )*
        }
    }
}

def_elements! {
    a "a"
    abbr "abbr"
    article "article"
    aside "aside"
    b "b"
    blockquote "blockquote"
    body "body"
    br "br"
    button "button"
    caption "caption"
    code "code"
    col "col"
    colgroup "colgroup"
    dd "dd"
    div "div"
    dl "dl"
    dt "dt"
    em "em"
    footer "footer"
    form "form"
    h1 "h1"
    h2 "h2"
    h3 "h3"
    h4 "h4"
    head "head"
    header "header"
    hr "hr"
    i "i"
    iframe "iframe"
    img "img"
    input "input"
    label "label"
    li "li"
    link "link"
    main "main"
    meta "meta"
    nav "nav"
    ol "ol"
    optgroup "optgroup"
    option "option"
    p "p"
    pre "pre"
    script "script"
    section "section"
    select "select"
    small "small"
    span "span"
    strong "strong"
    style "style"
    table "table"
    tbody "tbody"
    td "td"
    textarea "textarea"
    tfoot "tfoot"
    th "th"
    thead "thead"
    title "title"
    tr "tr"
    ul "ul"
}

#[cfg(test)]
mod tests {
    use crate::value::att;
    use super::*;

    #[test]
    fn t_shorthands() {
        let html = HtmlAllocator::new(100);
        let ul = html.ul([att("class", "menu")]).unwrap();
        html.append(ul, html.li(["one"]).unwrap()).unwrap();
        assert_eq!(html.to_html_string(ul, None).unwrap(),
                   "<ul class=\"menu\"><li>one</li></ul>");
        let table = html.table(()).unwrap();
        assert!(html.table_slots(table).is_ok());
    }
}
