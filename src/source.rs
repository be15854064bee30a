//! Rastreo de ubicaciones originales en código fuente.
//!
//! Los distintos objetos internos que el compilador construye
//! deben llevar cuenta de posiciones o rangos de ubicaciones en
//! el código fuente original, lo cual permite determinar un punto
//! exacto o aproximado en donde ocurre un error de abstracción
//! arbitraria.

use std::{
    fmt::{self, Debug, Display, Formatter},
    ops::Range,
    sync::Arc,
};

/// Ancho de los divisores de tabulador.
const TAB_STOP: u32 = 4;

/// Un flujo de entrada, carácter por carácter.
///
/// Cada carácter se acompaña de su propia ubicación.
pub trait InputStream: Iterator<Item = (char, Location)> {}

impl<I: Iterator<Item = (char, Location)>> InputStream for I {}

/// Un objeto cualquiera con una posición original asociada.
#[derive(Debug, Clone)]
pub struct Located<T> {
    location: Location,
    value: T,
}

impl<T> Located<T> {
    /// Obtiene el valor.
    pub fn val(&self) -> &T {
        &self.value
    }

    /// Obtiene la ubicación.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Descarta la ubicación y toma ownership del valor.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Descompone y toma ownership de las dos partes.
    pub fn split(self) -> (Location, T) {
        (self.location, self.value)
    }

    /// Construye a partir de un valor y una ubicación.
    pub fn at(value: T, location: Location) -> Self {
        Located { value, location }
    }
}

/// Una ubicación está conformada por un origen y un rango de posiciones.
#[derive(Clone)]
pub struct Location {
    from: Arc<Source>,
    position: Range<Position>,
}

impl Location {
    /// Unifica un rango de ubicaciones. Se asume el mismo origen.
    pub fn span(from: Location, to: &Location) -> Self {
        Location {
            from: from.from,
            position: from.position.start..to.position.end,
        }
    }

    /// Obtiene la posición de inicio.
    pub fn start(&self) -> Position {
        self.position.start
    }

    /// Obtiene la posición de fin.
    pub fn end(&self) -> Position {
        self.position.end
    }

    /// Obtiene el origen de esta ubicación.
    pub fn source(&self) -> &Source {
        &self.from
    }
}

impl Display for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:", self.from.name)?;

        let Range { start, end } = self.position;
        if end == start.advance() {
            // Solo se señala una columna en específico
            write!(formatter, "{}", start)
        } else {
            write!(formatter, "[{}-{}]", start, end.back())
        }
    }
}

impl Debug for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, formatter)
    }
}

/// Una posición línea-columna en un archivo.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Position {
    line: u32,
    column: u32,
}

impl Position {
    /// Obtiene el número de línea.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Obtiene el número de columna.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Incrementa el número de columna.
    pub fn advance(self) -> Position {
        Position {
            line: self.line,
            column: self.column + 1,
        }
    }

    /// Decrementa el número de columna.
    pub fn back(self) -> Position {
        Position {
            line: self.line,
            column: self.column - 1,
        }
    }

    /// Incrementa el número de línea y retorna a la columna 1.
    pub fn newline(self) -> Position {
        Position {
            line: self.line + 1,
            column: 1,
        }
    }

    /// Ajusta la posición a la siguiente columna de tabulador.
    pub fn tab(self) -> Position {
        let column = 1 + ((self.column - 1) / TAB_STOP + 1) * TAB_STOP;
        Position {
            line: self.line,
            column,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position { line: 1, column: 1 }
    }
}

impl Display for Position {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.line, self.column)
    }
}

/// Nombre de origen y las líneas que lo componen.
#[derive(Debug)]
pub struct Source {
    name: String,
    lines: Vec<String>,
}

impl Source {
    /// Obtiene una línea por número, comenzando en 1.
    pub fn line(&self, number: u32) -> Option<&str> {
        let index = (number as usize).checked_sub(1)?;
        self.lines.get(index).map(String::as_str)
    }
}

/// Transforma un texto completo en un flujo que itera por carácter.
///
/// La ubicación que se encuentra en la tupla de retorno corresponde
/// al inicio del texto, y es válida aun si el texto está vacío.
pub fn consume<'a>(text: &'a str, name: &str) -> (Location, impl InputStream + 'a) {
    let source = Arc::new(Source {
        name: String::from(name),
        lines: text.lines().map(String::from).collect(),
    });

    let start = Location {
        from: Arc::clone(&source),
        position: Position::default()..Position::default().advance(),
    };

    let mut here = Position::default();
    let chars = text.chars().map(move |c| {
        let location = Location {
            from: Arc::clone(&source),
            position: here..here.advance(),
        };

        here = match c {
            '\n' => here.newline(),
            '\t' => here.tab(),
            _ => here.advance(),
        };

        (c, location)
    });

    (start, chars)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn consume_when_newline_then_next_char_on_next_line() {
        let (_, stream) = consume("a\nb", "<test>");
        let positions: Vec<_> = stream.map(|(c, at)| (c, at.start())).collect();

        assert_eq!(positions[0].1, Position { line: 1, column: 1 });
        assert_eq!(positions[2].0, 'b');
        assert_eq!(positions[2].1, Position { line: 2, column: 1 });
    }

    #[test]
    fn consume_when_tab_then_column_jumps_to_stop() {
        let (_, stream) = consume("\tx", "<test>");
        let (c, location) = stream.last().unwrap();

        assert_eq!(c, 'x');
        assert_eq!(location.start().column(), 5);
    }

    #[test]
    fn span_when_single_column_then_displays_one_position() {
        let (_, stream) = consume("ab", "file.obs");
        let chars: Vec<_> = stream.collect();

        let single = chars[0].1.clone();
        assert_eq!(single.to_string(), "file.obs:1:1");

        let both = Location::span(chars[0].1.clone(), &chars[1].1);
        assert_eq!(both.to_string(), "file.obs:[1:1-1:2]");
    }

    #[test]
    fn line_when_out_of_range_then_none() {
        let (start, _) = consume("first\nsecond", "<test>");

        assert_eq!(start.source().line(2), Some("second"));
        assert_eq!(start.source().line(0), None);
        assert_eq!(start.source().line(3), None);
    }
}
