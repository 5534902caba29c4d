use colored::*;

use crate::tools::{ToolMetadata, ToolResult};

pub fn print_header(text: &str) {
    println!("\n{}", text.bright_cyan().bold());
    println!("{}", "=".repeat(text.len()).bright_cyan());
}

pub fn print_success(text: &str) {
    println!("{}", text.green());
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red().bold());
}

/// One tool with its parameters, required ones highlighted
pub fn print_tool(metadata: &ToolMetadata) {
    println!("{} {}", metadata.name.bold(), metadata.description.dimmed());
    for param in &metadata.parameters {
        let name = if param.required {
            param.name.yellow().bold()
        } else {
            param.name.normal()
        };
        match &param.default {
            Some(default) => println!(
                "    {} ({}, default {}): {}",
                name, param.param_type, default, param.description
            ),
            None => println!("    {} ({}): {}", name, param.param_type, param.description),
        }
    }
}

pub fn print_result(result: &ToolResult) {
    if result.success {
        print_success(&result.output);
    } else {
        print_error(&result.text());
    }
}
