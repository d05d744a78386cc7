use inkwell::context::Context;
use simplelang::Codegen;

/// Run lexing, parsing, and code generation; panic on any failure
pub fn compile<'ctx>(context: &'ctx Context, src: &str) -> Codegen<'ctx> {
    let tokens = simplelang::tokenize(src);
    let program = simplelang::parse(tokens).unwrap();
    let mut codegen = Codegen::new(context);
    codegen.generate(&program).unwrap();
    codegen
}

#[allow(dead_code)]
pub fn run_pipeline(src: &str) {
    let context = Context::create();
    let _codegen = compile(&context, src);
}

#[allow(dead_code)]
pub fn run_jit(src: &str) -> i32 {
    let context = Context::create();
    compile(&context, src).execute_jit().unwrap()
}
