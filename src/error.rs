//! Diagnósticos reportados al usuario.

use crate::source::{Located, Location};
use std::{
    error::Error,
    fmt::{self, Display},
};

/// Fase del compilador en la que se originó un diagnóstico.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Lexical,
    Syntax,
    Semantic,
}

impl Display for Phase {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string = match self {
            Phase::Lexical => "Lexical error",
            Phase::Syntax => "Syntax error",
            Phase::Semantic => "Semantic error",
        };

        fmt.write_str(string)
    }
}

/// Un error con fase, mensaje y ubicación.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    phase: Phase,
    message: String,
    location: Location,
}

impl Diagnostic {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Línea donde inicia el error, comenzando en 1.
    pub fn line(&self) -> u32 {
        self.location.start().line()
    }
}

impl Display for Diagnostic {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{} at {}: {}", self.phase, self.location, self.message)
    }
}

/// Lista ordenada de diagnósticos de una compilación fallida.
///
/// El orden es el de aparición en el código fuente, y es estable
/// entre ejecuciones.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    errors: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Construye a partir de los errores ubicados de una misma fase.
    pub fn collect<E, I>(phase: Phase, errors: I) -> Self
    where
        E: Error,
        I: IntoIterator<Item = Located<E>>,
    {
        let errors = errors
            .into_iter()
            .map(|error| {
                let (location, error) = error.split();
                Diagnostic {
                    phase,
                    message: error.to_string(),
                    location,
                }
            })
            .collect();

        Diagnostics { errors }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Error for Diagnostics {}

impl Display for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Diagnostics { errors } = self;

        if errors.is_empty() {
            return writeln!(fmt, "No errors were reported");
        }

        for error in errors {
            writeln!(fmt, "{}: {}", error.phase, error.message)?;

            let location = &error.location;
            writeln!(fmt, " --> {}", location)?;

            let digits = location.end().line().to_string().chars().count();
            writeln!(fmt, "{:digits$} |", "", digits = digits)?;

            for line_number in location.start().line()..=location.end().line() {
                let line = location.source().line(line_number).unwrap_or("");
                writeln!(fmt, "{:>digits$} | {}", line_number, line, digits = digits)?;
            }

            let (from, to) = (location.start().column(), location.end().column() - 1);
            let min = from.min(to);
            let max = from.max(to);

            let skip = (min - 1) as usize;
            let highlight = (max - min + 1) as usize;

            writeln!(
                fmt,
                "{:digits$} | {:skip$}{:^<highlight$}",
                "",
                "",
                "",
                digits = digits,
                skip = skip,
                highlight = highlight
            )?;

            writeln!(fmt)?;
        }

        let error_or_errors = if errors.len() == 1 { "error" } else { "errors" };
        writeln!(
            fmt,
            "Build failed with {} {}",
            errors.len(),
            error_or_errors
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{lex::Lexer, source};

    fn lexical(text: &str) -> Diagnostics {
        let (start, stream) = source::consume(text, "test.obs");
        let errors = Lexer::new(start, stream).try_exhaustive().unwrap_err();

        Diagnostics::collect(Phase::Lexical, errors)
    }

    #[test]
    fn collect_when_errors_then_phase_message_and_line_kept() {
        let diagnostics = lexical("a\nb @");

        assert_eq!(diagnostics.len(), 1);

        let diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(diagnostic.phase(), Phase::Lexical);
        assert_eq!(diagnostic.line(), 2);
        assert_eq!(diagnostic.message(), "Bad character '@' in input stream");
    }

    #[test]
    fn display_when_single_error_then_snippet_with_caret() {
        let rendered = lexical("a\nb @").to_string();

        assert_eq!(
            rendered,
            "Lexical error: Bad character '@' in input stream\n \
             --> test.obs:2:3\n  \
             |\n\
             2 | b @\n  \
             |   ^\n\
             \n\
             Build failed with 1 error\n"
        );
    }

    #[test]
    fn display_when_many_errors_then_plural_summary() {
        let rendered = lexical("@ $").to_string();

        assert!(rendered.ends_with("Build failed with 2 errors\n"));
    }

    #[test]
    fn display_when_empty_then_no_errors() {
        assert_eq!(Diagnostics::default().to_string(), "No errors were reported\n");
    }
}
