use arbor::{Key, Node, NodeKind, Path, ops, path};

#[test]
fn parsed_paths_address_the_same_slots() {
    let root = Node::new(NodeKind::Map);
    let parsed: Path = "servers[0]::host".parse().unwrap();
    assert_eq!(parsed, path!["servers", 0usize, "host"]);

    assert!(ops::set_at(&root, &parsed, "alpha").0);
    assert!(ops::at(&root, &path!["servers", 0usize, "host"]) == "alpha");
}

#[test]
fn display_round_trips() {
    for text in ["a::b::c", "list[3]::name", "[a::b]::[with[bracket]", "x[0][1]"] {
        let path: Path = text.parse().unwrap();
        let back: Path = path.to_string().parse().unwrap();
        assert_eq!(path, back, "round trip of {text}");
    }
}

#[test]
fn syntax_errors_are_reported() {
    let err: arbor::Error = "a::[b".parse::<Path>().unwrap_err().into();
    assert!(err.is_parse_error());
    assert_eq!(err.module(), "path");
}

#[test]
fn path_edits() {
    let mut path = path!["a", "b"];
    path.push_back(2usize);
    assert_eq!(path.back(), &Key::Index(2));
    let (parent, last) = path.split_last();
    assert_eq!(parent, path!["a", "b"]);
    assert_eq!(last, Key::Index(2));
    assert_eq!(path.pop_front(), Key::from("a"));
    assert_eq!(path.len(), 2);
}
