//! Code generation
//!
//! This module is responsible for lowering a syntax tree to LLVM IR. The
//! [Codegen] type owns one module (named `"SimpleLang"`) for the whole
//! compilation and can print it, write it to disk, or hand it to a JIT
//! execution engine.
//!
//! Every SimpleLang value is a 32-bit signed integer, except the direct
//! result of a comparison or logical operator, which is a single bit.
//! Variables live in stack slots allocated in the entry block of their
//! function; reads load, writes store.

use std::collections::HashMap;
use std::mem;
use std::path::Path;

use miette::Diagnostic;
use thiserror::Error;

use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::targets::{InitializationConfig, Target};
use inkwell::types::BasicMetadataTypeEnum;
use inkwell::values::{BasicMetadataValueEnum, FunctionValue, IntValue, PointerValue};
use inkwell::{IntPredicate, OptimizationLevel};

use crate::ast::{Expression, Program, Statement};

#[derive(Debug, Error, Diagnostic)]
pub enum CodegenError {
    #[error("The LLVM builder failed: {0}")]
    Builder(#[from] inkwell::builder::BuilderError),

    #[error("Unknown variable name: {0}")]
    UnknownVariable(String),

    #[error("Unknown function referenced: {0}")]
    UnknownFunction(String),

    #[error("Incorrect number of arguments passed to function: {0}")]
    WrongNumberOfArguments(String),

    #[error("Unknown binary operator: {0}")]
    UnknownBinaryOperator(String),

    #[error("Unknown unary operator: {0}")]
    UnknownUnaryOperator(String),

    #[error("Invalid operand for {0}")]
    InvalidOperand(&'static str),

    #[error("No active insertion block; only function declarations may appear at the top level")]
    NoInsertionBlock,

    #[error("Module verification failed: {0}")]
    ModuleVerification(String),

    #[error("Function verification failed for: {0}")]
    FunctionVerification(String),

    #[error("Main function not found")]
    MissingMain,

    #[error("Failed to create execution engine: {0}")]
    EngineCreation(String),

    #[error("Could not open file: {0}")]
    FileOpen(String),
}

type Result<T> = std::result::Result<T, CodegenError>;

pub struct Codegen<'ctx> {
    context: &'ctx Context,
    builder: Builder<'ctx>,
    module: Module<'ctx>,

    /// Variable name to its stack slot, scoped per function
    named_values: HashMap<String, PointerValue<'ctx>>,
    /// Functions declared so far; forward references stay unresolved
    functions: HashMap<String, FunctionValue<'ctx>>,
    current_function: Option<FunctionValue<'ctx>>,
}

impl<'ctx> Codegen<'ctx> {
    pub fn new(context: &'ctx Context) -> Self {
        let builder = context.create_builder();
        let module = context.create_module("SimpleLang");

        Self {
            context,
            builder,
            module,
            named_values: HashMap::new(),
            functions: HashMap::new(),
            current_function: None,
        }
    }

    /// Lower a whole program into the module
    pub fn generate(&mut self, program: &Program) -> Result<()> {
        for statement in &program.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    /// The module as textual LLVM IR
    pub fn dump_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Write the module as a textual `.ll` file
    pub fn write_ir_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.module
            .print_to_file(path)
            .map_err(|err| CodegenError::FileOpen(err.to_string()))
    }

    /// Verify the module, move it into an execution engine, and run `main`
    ///
    /// Consumes the generator: once the engine owns the module it must not
    /// be reused, and taking `self` by value makes that impossible.
    pub fn execute_jit(self) -> Result<i32> {
        Target::initialize_native(&InitializationConfig::default())
            .map_err(CodegenError::EngineCreation)?;

        self.module
            .verify()
            .map_err(|err| CodegenError::ModuleVerification(err.to_string()))?;

        let engine = self
            .module
            .create_jit_execution_engine(OptimizationLevel::None)
            .map_err(|err| CodegenError::EngineCreation(err.to_string()))?;

        if self.module.get_function("main").is_none() {
            return Err(CodegenError::MissingMain);
        }

        let main = unsafe { engine.get_function::<unsafe extern "C" fn() -> i32>("main") }
            .map_err(|err| CodegenError::EngineCreation(err.to_string()))?;

        Ok(unsafe { main.call() })
    }

    /// Stack slots always live at the start of the entry block, no matter
    /// where the declaration appears in the body.
    fn create_entry_block_alloca(
        &self,
        function: FunctionValue<'ctx>,
        name: &str,
    ) -> Result<PointerValue<'ctx>> {
        let builder = self.context.create_builder();

        let entry = function
            .get_first_basic_block()
            .ok_or(CodegenError::NoInsertionBlock)?;
        match entry.get_first_instruction() {
            Some(first) => builder.position_before(&first),
            None => builder.position_at_end(entry),
        }

        Ok(builder.build_alloca(self.context.i32_type(), name)?)
    }

    /// `if` and `while` conditions may be i32; anything wider than one bit
    /// is compared against zero to produce the i1 a branch needs.
    fn coerce_to_bool(&self, value: IntValue<'ctx>, name: &str) -> Result<IntValue<'ctx>> {
        if value.get_type().get_bit_width() == 1 {
            return Ok(value);
        }

        Ok(self.builder.build_int_compare(
            IntPredicate::NE,
            value,
            self.context.i32_type().const_zero(),
            name,
        )?)
    }

    /// Whether the block under the cursor still lacks a terminator
    fn block_is_open(&self) -> bool {
        self.builder
            .get_insert_block()
            .map_or(false, |block| block.get_terminator().is_none())
    }

    fn compile_statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::VarDecl { name, initializer } => {
                let function = self
                    .current_function
                    .ok_or(CodegenError::NoInsertionBlock)?;
                let alloca = self.create_entry_block_alloca(function, name)?;

                let value = match initializer {
                    Some(initializer) => self.compile_expression(initializer)?,
                    None => self.context.i32_type().const_zero(),
                };
                self.builder.build_store(alloca, value)?;

                // A re-declaration overwrites the entry; the earlier slot
                // becomes unreachable.
                self.named_values.insert(name.clone(), alloca);
                Ok(())
            }

            Statement::Assign { name, value } => {
                let alloca = *self
                    .named_values
                    .get(name)
                    .ok_or_else(|| CodegenError::UnknownVariable(name.clone()))?;

                let value = self.compile_expression(value)?;
                self.builder.build_store(alloca, value)?;
                Ok(())
            }

            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => self.compile_if(condition, then_branch, else_branch.as_deref()),

            Statement::While { condition, body } => self.compile_while(condition, body),

            Statement::Block(statements) => {
                for statement in statements {
                    self.compile_statement(statement)?;
                }
                Ok(())
            }

            Statement::FnDecl { name, params, body } => self.compile_function(name, params, body),

            Statement::Return(value) => {
                let value = match value {
                    Some(value) => self.compile_expression(value)?,
                    None => self.context.i32_type().const_zero(),
                };
                self.builder.build_return(Some(&value))?;
                Ok(())
            }

            Statement::ExprStmt(expr) => {
                // Evaluated for effect, result discarded
                self.compile_expression(expr)?;
                Ok(())
            }
        }
    }

    fn compile_if(
        &mut self,
        condition: &Expression,
        then_branch: &Statement,
        else_branch: Option<&Statement>,
    ) -> Result<()> {
        let function = self
            .current_function
            .ok_or(CodegenError::NoInsertionBlock)?;

        let condition = self.compile_expression(condition)?;
        let condition = self.coerce_to_bool(condition, "ifcond")?;

        let then_block = self.context.append_basic_block(function, "then");
        let else_block = else_branch.map(|_| self.context.append_basic_block(function, "else"));
        let merge_block = self.context.append_basic_block(function, "ifcont");

        self.builder
            .build_conditional_branch(condition, then_block, else_block.unwrap_or(merge_block))?;

        self.builder.position_at_end(then_block);
        self.compile_statement(then_branch)?;
        // A branch ending in `return` already has its terminator
        if self.block_is_open() {
            self.builder.build_unconditional_branch(merge_block)?;
        }

        if let (Some(else_block), Some(else_branch)) = (else_block, else_branch) {
            self.builder.position_at_end(else_block);
            self.compile_statement(else_branch)?;
            if self.block_is_open() {
                self.builder.build_unconditional_branch(merge_block)?;
            }
        }

        self.builder.position_at_end(merge_block);
        Ok(())
    }

    fn compile_while(&mut self, condition: &Expression, body: &Statement) -> Result<()> {
        let function = self
            .current_function
            .ok_or(CodegenError::NoInsertionBlock)?;

        let cond_block = self.context.append_basic_block(function, "whilecond");
        let body_block = self.context.append_basic_block(function, "whilebody");
        let after_block = self.context.append_basic_block(function, "afterwhile");

        self.builder.build_unconditional_branch(cond_block)?;

        self.builder.position_at_end(cond_block);
        let condition = self.compile_expression(condition)?;
        let condition = self.coerce_to_bool(condition, "whilecond")?;
        self.builder
            .build_conditional_branch(condition, body_block, after_block)?;

        self.builder.position_at_end(body_block);
        self.compile_statement(body)?;
        if self.block_is_open() {
            self.builder.build_unconditional_branch(cond_block)?;
        }

        self.builder.position_at_end(after_block);
        Ok(())
    }

    fn compile_function(&mut self, name: &str, params: &[String], body: &[Statement]) -> Result<()> {
        let i32_type = self.context.i32_type();
        let param_types: Vec<BasicMetadataTypeEnum> = vec![i32_type.into(); params.len()];
        let fn_type = i32_type.fn_type(&param_types, false);
        let function = self.module.add_function(name, fn_type, None);

        for (param, param_name) in function.get_param_iter().zip(params) {
            param.set_name(param_name);
        }

        // Registered before the body is lowered so direct recursion can
        // resolve itself.
        self.functions.insert(name.to_string(), function);

        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        let saved_values = mem::take(&mut self.named_values);
        let saved_function = self.current_function.replace(function);

        for (param, param_name) in function.get_param_iter().zip(params) {
            let alloca = self.create_entry_block_alloca(function, param_name)?;
            self.builder.build_store(alloca, param)?;
            self.named_values.insert(param_name.clone(), alloca);
        }

        for statement in body {
            self.compile_statement(statement)?;
        }

        // Fall-through bodies return 0
        if self.block_is_open() {
            self.builder.build_return(Some(&i32_type.const_zero()))?;
        }

        if !function.verify(true) {
            unsafe { function.delete() };
            return Err(CodegenError::FunctionVerification(name.to_string()));
        }

        self.named_values = saved_values;
        self.current_function = saved_function;

        Ok(())
    }

    fn compile_expression(&mut self, expr: &Expression) -> Result<IntValue<'ctx>> {
        match expr {
            Expression::NumberLit(value) => {
                Ok(self.context.i32_type().const_int(*value as u64, true))
            }

            Expression::BoolLit(value) => {
                Ok(self.context.bool_type().const_int(*value as u64, false))
            }

            Expression::Var(name) => {
                let alloca = *self
                    .named_values
                    .get(name)
                    .ok_or_else(|| CodegenError::UnknownVariable(name.clone()))?;

                let value = self
                    .builder
                    .build_load(alloca, name)?;
                Ok(value.into_int_value())
            }

            Expression::BinOp { op, lhs, rhs } => {
                let lhs = self.compile_expression(lhs)?;
                let rhs = self.compile_expression(rhs)?;

                let value = match op.as_str() {
                    "+" => self.builder.build_int_add(lhs, rhs, "addtmp")?,
                    "-" => self.builder.build_int_sub(lhs, rhs, "subtmp")?,
                    "*" => self.builder.build_int_mul(lhs, rhs, "multmp")?,
                    "/" => self.builder.build_int_signed_div(lhs, rhs, "divtmp")?,
                    "<" => {
                        self.builder
                            .build_int_compare(IntPredicate::SLT, lhs, rhs, "cmptmp")?
                    }
                    "<=" => {
                        self.builder
                            .build_int_compare(IntPredicate::SLE, lhs, rhs, "cmptmp")?
                    }
                    ">" => {
                        self.builder
                            .build_int_compare(IntPredicate::SGT, lhs, rhs, "cmptmp")?
                    }
                    ">=" => {
                        self.builder
                            .build_int_compare(IntPredicate::SGE, lhs, rhs, "cmptmp")?
                    }
                    "==" => {
                        self.builder
                            .build_int_compare(IntPredicate::EQ, lhs, rhs, "cmptmp")?
                    }
                    "!=" => {
                        self.builder
                            .build_int_compare(IntPredicate::NE, lhs, rhs, "cmptmp")?
                    }
                    // Logical operators are bitwise; both operands are
                    // always evaluated.
                    "&&" => self.builder.build_and(lhs, rhs, "andtmp")?,
                    "||" => self.builder.build_or(lhs, rhs, "ortmp")?,
                    _ => return Err(CodegenError::UnknownBinaryOperator(op.clone())),
                };

                Ok(value)
            }

            Expression::UnaryOp { op, operand } => {
                let operand = self.compile_expression(operand)?;

                match op.as_str() {
                    "-" => Ok(self.builder.build_int_neg(operand, "negtmp")?),
                    "!" => Ok(self.builder.build_not(operand, "nottmp")?),
                    _ => Err(CodegenError::UnknownUnaryOperator(op.clone())),
                }
            }

            Expression::Call { function, args } => {
                let callee = *self
                    .functions
                    .get(function)
                    .ok_or_else(|| CodegenError::UnknownFunction(function.clone()))?;

                if callee.count_params() as usize != args.len() {
                    return Err(CodegenError::WrongNumberOfArguments(function.clone()));
                }

                let mut compiled_args: Vec<BasicMetadataValueEnum> =
                    Vec::with_capacity(args.len());
                for arg in args {
                    compiled_args.push(self.compile_expression(arg)?.into());
                }

                let result = self.builder.build_call(callee, &compiled_args, "calltmp")?;
                result
                    .try_as_basic_value()
                    .left()
                    .map(|value| value.into_int_value())
                    .ok_or(CodegenError::InvalidOperand("function call"))
            }
        }
    }
}
