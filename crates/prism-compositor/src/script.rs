// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Line-oriented compositor script parser.
//!
//! Statements end at the end of a line. Blocks open with `{`, either on the
//! header line or on the next one, and close with `}`. Text after `//` is
//! ignored. A malformed statement is reported and skipped; a block with a
//! malformed header is skipped as a whole.

use crate::error::ScriptError;
use crate::model::{
    CompositionPass, CompositionTargetPass, CompositionTechnique, Compositor, InputMode, PassType,
    TextureDefinition,
};
use prism_core::math::LinearRgba;
use prism_core::renderer::{CompareFunction, PixelFormat, StencilOperation};
use std::str::FromStr;

/// Parses every compositor in `source`.
///
/// `file` only labels diagnostics. Returns the compositors that were closed
/// properly and every problem found, in order. Each problem is also logged.
pub fn parse_script(source: &str, file: &str) -> (Vec<Compositor>, Vec<ScriptError>) {
    let mut parser = Parser::new(file);
    for (number, line) in source.lines().enumerate() {
        parser.line = number + 1;
        parser.parse_line(line);
        if parser.aborted {
            break;
        }
    }
    parser.finish();
    (parser.compositors, parser.errors)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Compositor,
    Technique,
    Target,
    Pass,
    Clear,
    Stencil,
    Skip,
}

// A block header waiting for its opening brace.
#[derive(Debug)]
enum Opening {
    Compositor(String),
    Technique,
    Target(Option<String>),
    Pass(PassType),
    Clear,
    Stencil,
    Skip,
}

struct Parser<'a> {
    file: &'a str,
    line: usize,
    stack: Vec<Section>,
    pending: Option<Opening>,
    compositor: Option<Compositor>,
    technique: Option<CompositionTechnique>,
    target: Option<CompositionTargetPass>,
    pass: Option<CompositionPass>,
    compositors: Vec<Compositor>,
    errors: Vec<ScriptError>,
    aborted: bool,
}

type Parsed<T> = Result<T, String>;

impl<'a> Parser<'a> {
    fn new(file: &'a str) -> Self {
        Self {
            file,
            line: 0,
            stack: Vec::new(),
            pending: None,
            compositor: None,
            technique: None,
            target: None,
            pass: None,
            compositors: Vec::new(),
            errors: Vec::new(),
            aborted: false,
        }
    }

    fn section(&self) -> Option<Section> {
        self.stack.last().copied()
    }

    fn report(&mut self, error: ScriptError) {
        log::error!("{error}");
        self.errors.push(error);
    }

    fn syntax(&mut self, message: impl Into<String>) {
        self.report(ScriptError::Syntax {
            file: self.file.to_owned(),
            line: self.line,
            message: message.into(),
        });
    }

    fn parse_line(&mut self, line: &str) {
        let code = line.split_once("//").map_or(line, |(code, _)| code);
        let spaced = code.replace('{', " { ").replace('}', " } ");
        let mut statement: Vec<&str> = Vec::new();
        for token in spaced.split_whitespace() {
            match token {
                "{" => {
                    if !statement.is_empty() {
                        self.header(&statement);
                        statement.clear();
                    }
                    self.open();
                }
                "}" => {
                    if !statement.is_empty() {
                        self.statement(&statement);
                        statement.clear();
                    }
                    self.close();
                }
                _ => statement.push(token),
            }
            if self.aborted {
                return;
            }
        }
        if !statement.is_empty() {
            if is_header(self.section(), statement[0]) {
                self.header(&statement);
            } else {
                self.statement(&statement);
            }
        }
    }

    fn expect_no_pending(&mut self) {
        if let Some(opening) = self.pending.take() {
            self.syntax(format!("expected '{{' after {opening:?} header"));
        }
    }

    fn header(&mut self, tokens: &[&str]) {
        self.expect_no_pending();
        let section = self.section();
        if section == Some(Section::Skip) {
            self.pending = Some(Opening::Skip);
            return;
        }
        if section.is_none() && tokens[0] != "compositor" {
            self.abort(tokens[0]);
            return;
        }
        let opening = match opening(section, tokens) {
            Ok(opening) => opening,
            Err(message) => {
                self.syntax(message);
                Opening::Skip
            }
        };
        self.pending = Some(opening);
    }

    fn abort(&mut self, found: &str) {
        self.report(ScriptError::MissingCompositor {
            file: self.file.to_owned(),
            line: self.line,
            found: found.to_owned(),
        });
        self.aborted = true;
    }

    fn open(&mut self) {
        if self.section() == Some(Section::Skip) {
            self.pending = None;
            self.stack.push(Section::Skip);
            return;
        }
        let Some(opening) = self.pending.take() else {
            if self.section().is_none() {
                self.abort("{");
            } else {
                self.syntax("unexpected '{'");
                self.stack.push(Section::Skip);
            }
            return;
        };
        let section = match opening {
            Opening::Compositor(name) => {
                self.compositor = Some(Compositor::new(name));
                Section::Compositor
            }
            Opening::Technique => {
                self.technique = Some(CompositionTechnique::default());
                Section::Technique
            }
            Opening::Target(output) => {
                self.target = Some(CompositionTargetPass::new(output));
                Section::Target
            }
            Opening::Pass(pass_type) => {
                self.pass = Some(CompositionPass::new(pass_type));
                Section::Pass
            }
            Opening::Clear => Section::Clear,
            Opening::Stencil => Section::Stencil,
            Opening::Skip => Section::Skip,
        };
        self.stack.push(section);
    }

    fn close(&mut self) {
        self.expect_no_pending();
        let Some(section) = self.stack.pop() else {
            self.syntax("unexpected '}'");
            return;
        };
        match section {
            Section::Compositor => {
                if let Some(compositor) = self.compositor.take() {
                    self.compositors.push(compositor);
                }
            }
            Section::Technique => {
                if let (Some(technique), Some(compositor)) =
                    (self.technique.take(), self.compositor.as_mut())
                {
                    compositor.push_technique(technique);
                }
            }
            Section::Target => {
                let Some(target) = self.target.take() else {
                    return;
                };
                let Some(technique) = self.technique.as_mut() else {
                    return;
                };
                if target.is_output() {
                    technique.output_target = target;
                } else {
                    technique.target_passes.push(target);
                }
            }
            Section::Pass => {
                if let (Some(pass), Some(target)) = (self.pass.take(), self.target.as_mut()) {
                    target.passes.push(pass);
                }
            }
            Section::Clear | Section::Stencil | Section::Skip => {}
        }
    }

    fn statement(&mut self, tokens: &[&str]) {
        self.expect_no_pending();
        let result = match self.section() {
            None => {
                self.abort(tokens[0]);
                return;
            }
            Some(Section::Skip) => Ok(()),
            Some(Section::Compositor) => Err(format!("unknown compositor attribute '{}'", tokens[0])),
            Some(Section::Technique) => self.technique_attribute(tokens),
            Some(Section::Target) => self.target_attribute(tokens),
            Some(Section::Pass) => self.pass_attribute(tokens),
            Some(Section::Clear) => self.clear_attribute(tokens),
            Some(Section::Stencil) => self.stencil_attribute(tokens),
        };
        if let Err(message) = result {
            self.syntax(message);
        }
    }

    fn technique_attribute(&mut self, tokens: &[&str]) -> Parsed<()> {
        let Some(technique) = self.technique.as_mut() else {
            return Ok(());
        };
        match tokens {
            ["texture", name, width, height, format_name, ..] => {
                let width = parse_dimension(width, "target_width")?;
                let height = parse_dimension(height, "target_height")?;
                let format = PixelFormat::from_name(format_name)
                    .ok_or_else(|| format!("unknown pixel format '{format_name}'"))?;
                if technique.texture(name).is_some() {
                    return Err(format!("texture '{name}' is already defined"));
                }
                technique.textures.push(TextureDefinition {
                    name: (*name).to_owned(),
                    width,
                    height,
                    format,
                });
                Ok(())
            }
            ["texture", ..] => Err("texture expects <name> <width> <height> <format>".into()),
            [keyword, ..] => Err(format!("unknown technique attribute '{keyword}'")),
            [] => Ok(()),
        }
    }

    fn target_attribute(&mut self, tokens: &[&str]) -> Parsed<()> {
        let Some(target) = self.target.as_mut() else {
            return Ok(());
        };
        match tokens {
            ["input", "none"] => target.input_mode = InputMode::None,
            ["input", "previous"] => target.input_mode = InputMode::Previous,
            ["input", other] => return Err(format!("unknown input mode '{other}'")),
            ["only_initial", value] => target.only_initial = parse_switch(value)?,
            ["visibility_mask", value] => target.visibility_mask = parse_mask(value)?,
            ["lod_bias", value] => target.lod_bias = parse_number(value)?,
            ["material_scheme", name] => target.material_scheme = (*name).to_owned(),
            [keyword, ..] => return Err(wrong_arguments("target", keyword)),
            [] => {}
        }
        Ok(())
    }

    fn pass_attribute(&mut self, tokens: &[&str]) -> Parsed<()> {
        let Some(pass) = self.pass.as_mut() else {
            return Ok(());
        };
        match tokens {
            ["material", name] => pass.material_name = Some((*name).to_owned()),
            ["input", index, name] => {
                let index: usize = parse_number(index)?;
                pass.set_input(index, *name);
            }
            ["identifier", value] => pass.identifier = parse_number(value)?,
            ["first_render_queue", value] => pass.first_render_queue = parse_number(value)?,
            ["last_render_queue", value] => pass.last_render_queue = parse_number(value)?,
            [keyword, ..] => return Err(wrong_arguments("pass", keyword)),
            [] => {}
        }
        Ok(())
    }

    fn clear_attribute(&mut self, tokens: &[&str]) -> Parsed<()> {
        let Some(pass) = self.pass.as_mut() else {
            return Ok(());
        };
        let clear = &mut pass.clear;
        match tokens {
            ["buffers", buffers @ ..] if !buffers.is_empty() => {
                let (mut colour, mut depth, mut stencil) = (false, false, false);
                for buffer in buffers {
                    match *buffer {
                        "colour" => colour = true,
                        "depth" => depth = true,
                        "stencil" => stencil = true,
                        other => return Err(format!("unknown buffer '{other}'")),
                    }
                }
                (clear.colour, clear.depth, clear.stencil) = (colour, depth, stencil);
            }
            ["colour_value" | "colour", r, g, b, a] => {
                clear.colour_value = LinearRgba::new(
                    parse_number(r)?,
                    parse_number(g)?,
                    parse_number(b)?,
                    parse_number(a)?,
                );
            }
            ["depth_value", value] => clear.depth_value = parse_number(value)?,
            ["stencil_value", value] => clear.stencil_value = parse_number(value)?,
            [keyword, ..] => return Err(wrong_arguments("clear", keyword)),
            [] => {}
        }
        Ok(())
    }

    fn stencil_attribute(&mut self, tokens: &[&str]) -> Parsed<()> {
        let Some(pass) = self.pass.as_mut() else {
            return Ok(());
        };
        let stencil = &mut pass.stencil;
        match tokens {
            ["check", value] => stencil.check = parse_switch(value)?,
            ["comp_func" | "compare_func", name] => stencil.function = parse_compare_function(name)?,
            ["ref_value", value] => stencil.reference = parse_number(value)?,
            ["mask", value] => stencil.mask = parse_mask(value)?,
            ["fail_op", name] => stencil.fail_op = parse_stencil_op(name)?,
            ["depth_fail_op", name] => stencil.depth_fail_op = parse_stencil_op(name)?,
            ["pass_op", name] => stencil.pass_op = parse_stencil_op(name)?,
            ["two_sided", value] => stencil.two_sided = parse_switch(value)?,
            [keyword, ..] => return Err(wrong_arguments("stencil", keyword)),
            [] => {}
        }
        Ok(())
    }

    fn finish(&mut self) {
        if self.aborted {
            return;
        }
        self.expect_no_pending();
        if !self.stack.is_empty() {
            self.syntax("unexpected end of file, unclosed block");
            if let Some(compositor) = self.compositor.take() {
                log::warn!("Dropping incomplete compositor '{}'", compositor.name());
            }
        }
    }
}

fn opening(section: Option<Section>, tokens: &[&str]) -> Parsed<Opening> {
    let args = &tokens[1..];
    let opening = match (section, tokens[0]) {
        (None, "compositor") => match args {
            [name] => Opening::Compositor((*name).to_owned()),
            _ => return Err("compositor expects exactly one name".into()),
        },
        (Some(Section::Compositor), "technique") => Opening::Technique,
        (Some(Section::Technique), "target") => match args {
            [name] => Opening::Target(Some((*name).to_owned())),
            _ => return Err("target expects exactly one texture name".into()),
        },
        (Some(Section::Technique), "target_output") => Opening::Target(None),
        (Some(Section::Target), "pass") => match args {
            ["render_quad"] => Opening::Pass(PassType::RenderQuad),
            ["clear"] => Opening::Pass(PassType::Clear),
            ["stencil"] => Opening::Pass(PassType::Stencil),
            ["render_scene"] => Opening::Pass(PassType::RenderScene),
            _ => return Err(format!("unknown pass type '{}'", args.join(" "))),
        },
        (Some(Section::Pass), "clear") => Opening::Clear,
        (Some(Section::Pass), "stencil") => Opening::Stencil,
        (_, keyword) => return Err(format!("unexpected block '{keyword}'")),
    };
    Ok(opening)
}

fn is_header(section: Option<Section>, keyword: &str) -> bool {
    matches!(
        (section, keyword),
        (None, "compositor")
            | (Some(Section::Compositor), "technique")
            | (Some(Section::Technique), "target" | "target_output")
            | (Some(Section::Target), "pass")
            | (Some(Section::Pass), "clear" | "stencil")
    )
}

fn wrong_arguments(block: &str, keyword: &str) -> String {
    format!("unknown {block} attribute or wrong argument count for '{keyword}'")
}

fn parse_number<T: FromStr>(token: &str) -> Parsed<T> {
    token
        .parse()
        .map_err(|_| format!("invalid number '{token}'"))
}

fn parse_dimension(token: &str, follow_target: &str) -> Parsed<u32> {
    if token == follow_target {
        Ok(0)
    } else {
        parse_number(token)
    }
}

fn parse_mask(token: &str) -> Parsed<u32> {
    match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).map_err(|_| format!("invalid mask '{token}'")),
        None => parse_number(token),
    }
}

fn parse_switch(token: &str) -> Parsed<bool> {
    match token {
        "on" | "true" => Ok(true),
        "off" | "false" => Ok(false),
        _ => Err(format!("expected on or off, found '{token}'")),
    }
}

fn parse_compare_function(name: &str) -> Parsed<CompareFunction> {
    let function = match name {
        "always_fail" => CompareFunction::Never,
        "always_pass" => CompareFunction::Always,
        "less" => CompareFunction::Less,
        "less_equal" => CompareFunction::LessEqual,
        "equal" => CompareFunction::Equal,
        "not_equal" => CompareFunction::NotEqual,
        "greater_equal" => CompareFunction::GreaterEqual,
        "greater" => CompareFunction::Greater,
        _ => return Err(format!("unknown compare function '{name}'")),
    };
    Ok(function)
}

fn parse_stencil_op(name: &str) -> Parsed<StencilOperation> {
    let op = match name {
        "keep" => StencilOperation::Keep,
        "zero" => StencilOperation::Zero,
        "replace" => StencilOperation::Replace,
        "increment" => StencilOperation::IncrementClamp,
        "decrement" => StencilOperation::DecrementClamp,
        "increment_wrap" => StencilOperation::IncrementWrap,
        "decrement_wrap" => StencilOperation::DecrementWrap,
        "invert" => StencilOperation::Invert,
        _ => return Err(format!("unknown stencil operation '{name}'")),
    };
    Ok(op)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brace_on_next_line() {
        let source = "compositor Grey\n{\n  technique\n  {\n    target_output\n    {\n      pass render_quad\n      {\n        material Grey\n      }\n    }\n  }\n}\n";
        let (compositors, errors) = parse_script(source, "grey.compositor");
        assert!(errors.is_empty(), "{errors:?}");
        let pass = &compositors[0].techniques()[0].output_target.passes[0];
        assert_eq!(pass.material_name.as_deref(), Some("Grey"));
    }

    #[test]
    fn test_single_line_blocks() {
        let source = "compositor A { technique { target_output { input previous } } }";
        let (compositors, errors) = parse_script(source, "a");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(
            compositors[0].techniques()[0].output_target.input_mode,
            InputMode::Previous
        );
    }

    #[test]
    fn test_unknown_pass_type_skips_block() {
        let source = "compositor A {\n technique {\n  target_output {\n   pass blit {\n    material X\n    clear { buffers colour }\n   }\n   pass clear { }\n  }\n }\n}\n";
        let (compositors, errors) = parse_script(source, "a");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line(), Some(4));
        let passes = &compositors[0].techniques()[0].output_target.passes;
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].pass_type, PassType::Clear);
    }

    #[test]
    fn test_mask_parsing() {
        assert_eq!(parse_mask("0xFF00"), Ok(0xFF00));
        assert_eq!(parse_mask("17"), Ok(17));
        assert!(parse_mask("0xZZ").is_err());
    }

    #[test]
    fn test_trailing_comment() {
        let source = "compositor A { // the effect\n technique { }\n}";
        let (compositors, errors) = parse_script(source, "a");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(compositors[0].techniques().len(), 1);
    }
}
