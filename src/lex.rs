//! Análisis léxico.
//!
//! # Tokenization
//! Esta es la primera fase del compilador. Descompone un [`InputStream`]
//! (flujo de caracteres) en unidades léxicas denominadas tokens. Los espacios
//! en blanco, los cambios de línea y los comentarios (`#` hasta el final de
//! la línea) se descartan durante esta operación. Cada token emitido está
//! asociado a una ubicación en el código fuente original, lo cual permite
//! rastrear errores en tanto los mismos como constructos más elevados de
//! fases posteriores.
//!
//! # Contenido de un token
//! Operadores, puntuación y palabras clave se identifican por el hecho de lo
//! que son y no incluyen lexemas. Los identificadores sí incluyen su lexema
//! original. Las constantes literales se resuelven a sus valores: los números
//! a enteros, los booleanos a `bool` y los mensajes a su texto sin comillas.
//!
//! # Reglas importantes del lenguaje
//! - Las palabras clave y los literales booleanos son case-insensitive, por
//!   lo cual tanto `quando` como `QUANDO` y `Quando` resultan en la palabra
//!   clave [`Keyword::When`].
//! - Los identificadores, en cambio, conservan y distinguen mayúsculas, ya que
//!   se traducen tal cual al lenguaje objetivo.
//! - Los mensajes no procesan secuencias de escape y no pueden contener
//!   comillas ni cambios de línea.
//!
//! # Errores
//! El lexer se recupera de condiciones de error descartando el carácter
//! inesperado y continuando el escaneo. Esto permite reportar todos los
//! errores léxicos de un archivo en una misma ejecución, pero no permite
//! el avance a las demás fases de la compilación.

use crate::source::{InputStream, Located, Location};
use std::{
    fmt::{self, Display},
    iter::Peekable,
    str::FromStr,
    sync::Arc,
};

use thiserror::Error;

// Case-insensitive
pub use unicase::Ascii as NoCase;

/// Literal entero máximo.
const INT_MAX: i32 = i32::MAX;

/// Error de escaneo.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LexerError {
    /// Carácter desconocido o inesperado en el flujo de entrada.
    #[error("Bad character {0:?} in input stream")]
    BadChar(char),

    /// Un mensaje no se cerró antes del fin de línea.
    #[error("Unterminated message, expected a closing '\"' before the end of the line")]
    UnterminatedMessage,

    /// Una constante entera se encuentra fuera de rango.
    #[error("Integer literal overflow, valid range is [0, {}]", INT_MAX)]
    IntOverflow,
}

/// Un identificador.
///
/// A diferencia de las palabras clave, la comparación entre identificadores
/// distingue mayúsculas de minúsculas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(Arc<str>);

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier(Arc::from(name))
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Identifier(Arc::from(name))
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}

/// Operador de comparación.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
}

impl Display for CmpOp {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CmpOp::*;

        let string = match self {
            Equal          => "==",
            NotEqual       => "!=",
            Greater        => ">",
            Less           => "<",
            GreaterOrEqual => ">=",
            LessOrEqual    => "<=",
        };

        fmt.write_str(string)
    }
}

/// Objeto resultante del análisis léxico.
///
/// Un token contiene suficiente información para describir completamente
/// a una entidad léxica en el programa fuente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Identificador.
    Id(Identifier),

    /// Palabra clave.
    Keyword(Keyword),

    /// Literal de entero.
    Number(i32),

    /// Literal booleano, `true` o `false` en cualquier capitalización.
    Boolean(bool),

    /// Mensaje entre comillas dobles, ya sin ellas.
    Message(String),

    /// Cualquiera de `==`, `!=`, `>`, `<`, `>=`, `<=`.
    Compare(CmpOp),

    /// `->`
    Arrow,

    /// `:`
    Colon,

    /// `[`
    OpenSquare,

    /// `]`
    CloseSquare,

    /// `,`
    Comma,

    /// `;`
    Semicolon,

    /// `=`
    Assign,
}

impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Token::*;

        match self {
            Id(id) => write!(fmt, "identifier `{}`", id),
            Keyword(keyword) => write!(fmt, "keyword `{}`", keyword),
            Number(integer) => write!(fmt, "literal `{}`", integer),
            Boolean(boolean) => write!(fmt, "literal `{}`", boolean),
            Message(message) => write!(fmt, "message \"{}\"", message),
            Compare(op) => write!(fmt, "`{}`", op),
            Arrow => fmt.write_str("`->`"),
            Colon => fmt.write_str("`:`"),
            OpenSquare => fmt.write_str("`[`"),
            CloseSquare => fmt.write_str("`]`"),
            Comma => fmt.write_str("`,`"),
            Semicolon => fmt.write_str("`;`"),
            Assign => fmt.write_str("`=`"),
        }
    }
}

/// Una palabra clave.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Keyword {
    Devices,
    EndDevices,
    Def,
    When,
    Else,
    Execute,
    On,
    TurnOn,
    TurnOff,
    Alert,
    To,
    Broadcast,
    And,
}

impl Display for Keyword {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Keyword::*;
        let string = match self {
            Devices    => "dispositivos",
            EndDevices => "fimdispositivos",
            Def        => "def",
            When       => "quando",
            Else       => "senao",
            Execute    => "execute",
            On         => "em",
            TurnOn     => "ligar",
            TurnOff    => "desligar",
            Alert      => "alerta",
            To         => "para",
            Broadcast  => "difundir",
            And        => "and",
        };

        fmt.write_str(string)
    }
}

impl FromStr for Keyword {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        use Keyword::*;

        const KEYWORDS: &[(NoCase<&str>, Keyword)] = &[
            (NoCase::new("dispositivos"),    Devices),
            (NoCase::new("fimdispositivos"), EndDevices),
            (NoCase::new("def"),             Def),
            (NoCase::new("quando"),          When),
            (NoCase::new("senao"),           Else),
            (NoCase::new("execute"),         Execute),
            (NoCase::new("em"),              On),
            (NoCase::new("ligar"),           TurnOn),
            (NoCase::new("desligar"),        TurnOff),
            (NoCase::new("alerta"),          Alert),
            (NoCase::new("para"),            To),
            (NoCase::new("difundir"),        Broadcast),
            (NoCase::new("and"),             And),
        ];

        KEYWORDS
            .iter()
            .find(|&&(name, _)| name == NoCase::new(string))
            .map(|&(_, keyword)| keyword)
            .ok_or(())
    }
}

/// Máquina de estados para análisis léxico.
///
/// Un lexer puede encontrarse en uno de diversos estados. La
/// salida del lexer, así como su siguiente estado, se define
/// a partir de tanto su estado actual como el siguiente carácter
/// encontrado en el flujo de entrada.
pub struct Lexer<S: Iterator> {
    source: Peekable<S>,
    state: State,
    start: Location,
    last: Location,
}

/// Posibles estados del lexer.
enum State {
    /// Estado que ocurre antes de encontrar el inicio de un token.
    Start,

    /// Estado de completitud; siempre emite el token incluido
    /// y pasa a [`State::Start`].
    Complete(Token),

    /// Se encontró `=`, que puede ser asignación o inicio de `==`.
    Equals,

    /// Se encontró `!`, que solo es válido como inicio de `!=`.
    Bang,

    /// Se encontró `>`.
    Greater,

    /// Se encontró `<`.
    Less,

    /// Se encontró `-`, que solo es válido como inicio de `->`.
    Dash,

    /// Comentario de línea.
    ///
    /// Este estado vuelve a [`State::Start`] al encontrar `'\n'`.
    Comment,

    /// Mensaje entre comillas, acumulado sin las mismas.
    Quoted(String),

    /// Constante entera.
    ///
    /// Este estado incluirá dígitos en el token mientras que
    /// el siguiente carácter sea un dígito. `None` indica que
    /// la constante ya desbordó, pero aún se consumen sus dígitos.
    Integer(Option<i32>),

    /// Término que puede ser un identificador, una palabra clave
    /// o un literal booleano.
    Word(String),
}

impl<S: InputStream> Lexer<S> {
    /// Crea un lexer en estado inicial a partir de un flujo.
    pub fn new(start: Location, source: S) -> Self {
        let last = start.clone();
        Lexer {
            source: source.peekable(),
            state: State::Start,
            start,
            last,
        }
    }

    /// Reduce la entrada a sea una secuencia conocida de tokens
    /// infalibles o una secuencia de errores.
    ///
    /// En caso de que ocurra al menos un error, el lexer dejará
    /// de buscar tokens exitosos y comenzará a acumular solamente
    /// errores. El propósito de esta función es permitir la
    /// recolección de múltiples errores léxicos en una misma ejecución
    /// del compilador.
    pub fn try_exhaustive(mut self) -> Result<Vec<Located<Token>>, Vec<Located<LexerError>>> {
        let mut tokens = Vec::new();

        while let Some(result) = self.next() {
            match result {
                Ok(token) => tokens.push(token),
                Err(error) => {
                    drop(tokens);

                    let mut errors = vec![error];
                    errors.extend(self.filter_map(Result::err));

                    return Err(errors);
                }
            }
        }

        Ok(tokens)
    }

    /// Intenta construir un siguiente token.
    fn lex(&mut self) -> Result<Option<Token>, LexerError> {
        use {State::*, Token::*};

        loop {
            let next_char = self.source.peek().map(|(c, _)| *c);

            // La posición de origen se mueve junto al siguiente carácter
            // siempre que no se haya encontrado una frontera de token
            if let (Start, Some((_, location))) = (&self.state, self.source.peek()) {
                self.start = location.clone();
            }

            // Switch table principal, determina cambios de estado
            // y de salida del lexer a partir de combinaciones del
            // estado actual y el siguiente carácter
            match (&mut self.state, next_char) {
                // Tokens triviales
                (Start, None) => return Ok(None),
                (Start, Some(':')) => self.state = Complete(Colon),
                (Start, Some('[')) => self.state = Complete(OpenSquare),
                (Start, Some(']')) => self.state = Complete(CloseSquare),
                (Start, Some(',')) => self.state = Complete(Comma),
                (Start, Some(';')) => self.state = Complete(Semicolon),

                // Operadores de uno o dos caracteres
                (Start, Some('=')) => self.state = Equals,
                (Start, Some('!')) => self.state = Bang,
                (Start, Some('>')) => self.state = Greater,
                (Start, Some('<')) => self.state = Less,
                (Start, Some('-')) => self.state = Dash,

                (Start, Some('#')) => self.state = Comment,
                (Start, Some('"')) => self.state = Quoted(String::new()),

                // Identificadores, palabras clave y booleanos
                (Start, Some(c)) if c.is_ascii_alphabetic() || c == '_' => {
                    self.state = Word(c.to_string())
                }

                // Inicio de una constante numérica. No se consume
                // el dígito, ya que esta lógica ya está implementada
                // en el respectivo caso para un estado de constante
                // entera para el cual el siguiente carácter es un
                // dígito. Por tanto, la constante es inicialmente cero.
                (Start, Some(c)) if c.is_ascii_digit() => {
                    self.state = Integer(Some(0));
                    continue;
                }

                // Espacios en blanco y caracteres inesperados
                (Start, Some(' ' | '\t' | '\r' | '\n')) => (),
                (Start, Some(c)) => {
                    self.bump();
                    break Err(LexerError::BadChar(c));
                }

                // Emisión retardada de tokens cualesquiera
                (Complete(value), _) => break Ok(Some(std::mem::replace(value, Semicolon))),

                (Equals, Some('=')) => self.state = Complete(Compare(CmpOp::Equal)),
                (Equals, _) => break Ok(Some(Assign)),

                (Bang, Some('=')) => self.state = Complete(Compare(CmpOp::NotEqual)),
                (Bang, _) => break Err(LexerError::BadChar('!')),

                (Greater, Some('=')) => self.state = Complete(Compare(CmpOp::GreaterOrEqual)),
                (Greater, _) => break Ok(Some(Compare(CmpOp::Greater))),

                (Less, Some('=')) => self.state = Complete(Compare(CmpOp::LessOrEqual)),
                (Less, _) => break Ok(Some(Compare(CmpOp::Less))),

                (Dash, Some('>')) => self.state = Complete(Arrow),
                (Dash, _) => break Err(LexerError::BadChar('-')),

                // Los comentarios descartan el resto de la línea
                (Comment, Some('\n')) => self.state = Start,
                (Comment, Some(_)) => (),
                (Comment, None) => self.state = Start,

                // El cambio de línea no se consume, así la recuperación
                // continúa en la siguiente línea
                (Quoted(text), Some('"')) => self.state = Complete(Message(std::mem::take(text))),
                (Quoted(_), None | Some('\n')) => break Err(LexerError::UnterminatedMessage),
                (Quoted(text), Some(c)) => text.push(c),

                // Acumulación dígito por dígito de constantes enteras
                (Integer(accumulated), Some(digit)) if digit.is_ascii_digit() => {
                    let digit = digit as i32 - '0' as i32;

                    *accumulated = accumulated
                        .and_then(|n| n.checked_mul(10))
                        .and_then(|n| n.checked_add(digit));
                }

                // Si sigue algo que no es un dígito, la constante ha terminado
                (Integer(Some(integer)), _) => break Ok(Some(Number(*integer))),
                (Integer(None), _) => break Err(LexerError::IntOverflow),

                // Extensión de términos
                (Word(word), Some(c)) if is_word_char(c) => word.push(c),

                // Si sigue algo que no puede formar parte del término, ha terminado
                (Word(word), _) => break Ok(Some(classify(std::mem::take(word)))),
            }

            // Si no hubo `continue` ni `break`, aquí se consume el carácter
            // que se observó con lookahead anteriormente
            self.bump();
        }
    }

    /// Consume el carácter actual, recordando su ubicación.
    fn bump(&mut self) {
        if let Some((_, location)) = self.source.next() {
            self.last = location;
        }
    }
}

impl<S: InputStream> Iterator for Lexer<S> {
    type Item = Result<Located<Token>, Located<LexerError>>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.lex();
        self.state = State::Start;

        let location = Location::span(self.start.clone(), &self.last);
        match result {
            Ok(None) => None,
            Ok(Some(token)) => Some(Ok(Located::at(token, location))),
            Err(error) => Some(Err(Located::at(error, location))),
        }
    }
}

/// Determina si un término es palabra clave, booleano o identificador.
fn classify(word: String) -> Token {
    if let Ok(keyword) = Keyword::from_str(&word) {
        Token::Keyword(keyword)
    } else if NoCase::new(word.as_str()) == NoCase::new("true") {
        Token::Boolean(true)
    } else if NoCase::new(word.as_str()) == NoCase::new("false") {
        Token::Boolean(false)
    } else {
        Token::Id(Identifier::from(word))
    }
}

/// Determina si un carácter puede pertenecer a un término.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
