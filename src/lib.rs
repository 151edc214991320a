//! Markdown with embedded JSX, compiled to nested call expressions.
//!
//! Block-level and inline JSX inside a Markdown document is recognized,
//! converted with a pluggable code transformer and kept verbatim in the
//! output, while the surrounding Markdown becomes calls such as
//! `p({}, "text")`.

pub mod error;
pub mod generate;
pub mod grammar;
pub mod options;
pub mod parser;
pub mod token;
pub mod transform;

pub use error::{Error, TransformError};
pub use generate::{RenderState, Rendered, Renderer, wrap_component};
pub use grammar::{Flavor, JsxTagGrammar, TagGrammar, TagMatch};
pub use options::{Highlighter, Options};
pub use parser::MarkdownParser;
pub use token::{AttrValue, Nesting, Token, TokenType};
pub use transform::{CodeTransformer, CreateElementTransformer};

/// Parser and renderer sharing one set of options.
pub struct Pipeline {
    parser: MarkdownParser,
    renderer: Renderer,
}

impl Pipeline {
    /// JSX grammar, `createElement` transformer, default options.
    pub fn standard() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        Self::custom(
            options,
            Box::new(JsxTagGrammar::new()),
            Box::new(CreateElementTransformer::new()),
        )
    }

    /// Pipeline with a caller-supplied tag grammar and code transformer.
    pub fn custom(
        options: Options,
        grammar: Box<dyn TagGrammar>,
        transformer: Box<dyn CodeTransformer>,
    ) -> Self {
        Self {
            parser: MarkdownParser::new(options.clone(), grammar, transformer),
            renderer: Renderer::new(options),
        }
    }

    pub fn parser(&self) -> &MarkdownParser {
        &self.parser
    }

    /// Mutable access, e.g. to register extra block or inline rules.
    pub fn parser_mut(&mut self) -> &mut MarkdownParser {
        &mut self.parser
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn parse(&self, source: &str) -> Vec<Token> {
        self.parser.parse(source)
    }

    pub fn render(&self, tokens: &[Token]) -> Rendered {
        self.renderer.render(tokens)
    }

    pub fn compile(&self, source: &str) -> Rendered {
        let tokens = self.parse(source);
        self.render(&tokens)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

pub fn transpile(source: &str) -> Rendered {
    transpile_with(source, Options::default())
}

pub fn transpile_with(source: &str, options: Options) -> Rendered {
    Pipeline::with_options(options).compile(source)
}
