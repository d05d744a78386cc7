mod common;
use common::run_pipeline;

#[test]
#[should_panic]
fn fail_parsing() {
    run_pipeline("function main( { return 1; }");
}

#[test]
#[should_panic]
fn fail_lexing_stray_ampersand() {
    run_pipeline("function main() { return 1 & 2; }");
}

#[test]
#[should_panic]
fn fail_unknown_variable() {
    run_pipeline("function main() { return x; }");
}

#[test]
#[should_panic]
fn fail_top_level_statement() {
    run_pipeline("var x = 1;");
}
