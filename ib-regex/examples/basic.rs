use ib_regex::Regex;

fn main() {
    let re = Regex::new(r"(?i)la vie est drôle").unwrap();
    assert!(re.is_match("LA VIE EST DRÔLE"));

    let re = Regex::new(r"(?P<word>\w+)@(?P<host>\w+\.\w+)").unwrap();
    for caps in re.captures_iter("bob@mail.com, αλίκη@mail.gr") {
        let word = caps.get_group_by_name("word").unwrap();
        let host = caps.get_group_by_name("host").unwrap();
        println!("{word:?} at {host:?}");
    }

    // Matching is unanchored by default, use `^` or `Input::builder(..).anchored(true)` for anchored one.
    let matches: Vec<_> = Regex::new("a*").unwrap().find_iter("baaab").collect();
    println!("{matches:?}");
}
