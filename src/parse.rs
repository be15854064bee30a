//! Análisis sintáctico.
//!
//! El parser es descendente recursivo con un token de lookahead. La
//! gramática no es ambigua bajo esta condición siempre que las cadenas
//! de `and` se asocien por la derecha. Ante el primer token que no
//! encaja con la gramática se aborta con un único error; no se intenta
//! recuperación para reportar múltiples errores sintácticos.

use std::{iter::Peekable, marker::PhantomData};
use thiserror::Error;

use crate::{
    lex::{CmpOp, Identifier, Keyword, Token},
    source::{Located, Location},
};

/// Árbol sintáctico de un programa completo.
///
/// Se construye una única vez y las fases posteriores solo lo leen.
#[derive(Debug)]
pub struct Ast {
    devices: Vec<Device>,
    commands: Vec<Command>,
}

impl Ast {
    /// Dispositivos en orden de declaración.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Comandos en orden de aparición, que es también su orden de ejecución.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

/// Un dispositivo declarado, opcionalmente con una variable observada.
#[derive(Debug)]
pub struct Device {
    name: Located<Identifier>,
    observed: Option<Located<Identifier>>,
}

impl Device {
    pub fn name(&self) -> &Located<Identifier> {
        &self.name
    }

    pub fn observed(&self) -> Option<&Located<Identifier>> {
        self.observed.as_ref()
    }
}

#[derive(Debug)]
pub enum Value {
    Number(i32),
    Boolean(bool),
    Identifier(Located<Identifier>),
}

#[derive(Debug)]
pub enum Condition {
    Compare {
        lhs: Located<Identifier>,
        op: CmpOp,
        rhs: Value,
    },

    /// `a > 1 and b < 2 and ...`, asociado por la derecha.
    And(Box<Condition>, Box<Condition>),
}

#[derive(Debug)]
pub enum Action {
    TurnOn(Located<Identifier>),

    TurnOff(Located<Identifier>),

    Alert {
        device: Located<Identifier>,
        message: String,
    },

    AlertWithVar {
        device: Located<Identifier>,
        message: String,
        variable: Located<Identifier>,
    },

    Broadcast {
        message: String,
        devices: Vec<Located<Identifier>>,
    },

    BroadcastWithVar {
        message: String,
        variable: Located<Identifier>,
        devices: Vec<Located<Identifier>>,
    },
}

#[derive(Debug)]
pub enum Command {
    Assign {
        name: Located<Identifier>,
        value: Value,
    },

    If {
        condition: Condition,
        then: Action,
    },

    IfElse {
        condition: Condition,
        then: Action,
        otherwise: Action,
    },

    Action(Action),
}

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Expected {0}, found {1} instead")]
    UnexpectedToken(Token, Token),

    #[error("Unexpected end of input, expected {0}")]
    MissingToken(Token),

    #[error("Expected identifier, found {0} instead")]
    ExpectedId(Token),

    #[error("Expected a number, boolean or identifier, found {0} instead")]
    ExpectedValue(Token),

    #[error("Expected a comparison operator, found {0} instead")]
    ExpectedComparison(Token),

    #[error("Expected a quoted message, found {0} instead")]
    ExpectedMessage(Token),

    #[error("Expected `ligar` or `desligar`, found {0} instead")]
    ExpectedSwitch(Token),

    #[error("Expected any of `def`, `quando`, `execute`, `alerta` or `difundir`, found {0} instead")]
    ExpectedCommand(Token),

    #[error("Expected any of `execute`, `alerta` or `difundir`, found {0} instead")]
    ExpectedAction(Token),

    #[error("Expected `->` or a variable, found {0} instead")]
    ExpectedArrow(Token),

    #[error("Unexpected end of input")]
    UnexpectedEof,
}

/// Construye el árbol sintáctico a partir de un flujo de tokens.
///
/// `start` es la ubicación asignada a errores que ocurren antes de haber
/// leído cualquier token, como en el caso de una entrada vacía.
pub fn parse<'a, I>(tokens: I, start: Location) -> Result<Ast, Located<ParserError>>
where
    I: Iterator<Item = &'a Located<Token>>,
{
    let mut parser = Parser {
        tokens: tokens.peekable(),
        last_known: start,
        lifetime_hack: PhantomData,
    };

    parser.program()
}

struct Parser<'a, I: Iterator<Item = &'a Located<Token>>> {
    tokens: Peekable<I>,
    last_known: Location,
    lifetime_hack: PhantomData<&'a ()>,
}

type Parse<T> = Result<T, Located<ParserError>>;

impl<'a, I: Iterator<Item = &'a Located<Token>>> Parser<'a, I> {
    fn program(&mut self) -> Parse<Ast> {
        let devices = self.devices()?;

        // Al menos un comando, cada uno terminado en `;`
        let mut commands = Vec::new();
        loop {
            commands.push(self.command()?);
            self.expect(Token::Semicolon)?;

            if self.tokens.peek().is_none() {
                break Ok(Ast { devices, commands });
            }
        }
    }

    fn devices(&mut self) -> Parse<Vec<Device>> {
        self.keyword(Keyword::Devices)?;
        self.expect(Token::Colon)?;

        let mut devices = vec![self.device()?];
        while !self.peek_is(&Token::Keyword(Keyword::EndDevices)) {
            devices.push(self.device()?);
        }

        self.keyword(Keyword::EndDevices)?;
        Ok(devices)
    }

    fn device(&mut self) -> Parse<Device> {
        let name = self.id()?;

        let observed = if self.accept(&Token::OpenSquare) {
            let observed = self.id()?;
            self.expect(Token::CloseSquare)?;
            Some(observed)
        } else {
            None
        };

        Ok(Device { name, observed })
    }

    fn command(&mut self) -> Parse<Command> {
        match self.tokens.peek().map(|token| token.val()) {
            Some(Token::Keyword(Keyword::Def)) => self.assignment(),
            Some(Token::Keyword(Keyword::When)) => self.conditional(),
            Some(Token::Keyword(Keyword::Execute | Keyword::Alert | Keyword::Broadcast)) => {
                Ok(Command::Action(self.action()?))
            }

            _ => {
                let found = self.next()?.into_inner();
                self.fail(ParserError::ExpectedCommand(found))
            }
        }
    }

    fn assignment(&mut self) -> Parse<Command> {
        self.keyword(Keyword::Def)?;
        let name = self.id()?;

        self.expect(Token::Assign)?;
        let value = self.value()?;

        Ok(Command::Assign { name, value })
    }

    fn conditional(&mut self) -> Parse<Command> {
        self.keyword(Keyword::When)?;
        let condition = self.condition()?;

        self.expect(Token::Colon)?;
        let then = self.action()?;

        if self.accept(&Token::Keyword(Keyword::Else)) {
            let otherwise = self.action()?;
            Ok(Command::IfElse {
                condition,
                then,
                otherwise,
            })
        } else {
            Ok(Command::If { condition, then })
        }
    }

    fn condition(&mut self) -> Parse<Condition> {
        let lhs = self.id()?;

        let op = match self.next()?.into_inner() {
            Token::Compare(op) => op,
            found => self.fail(ParserError::ExpectedComparison(found))?,
        };

        let rhs = self.value()?;
        let compare = Condition::Compare { lhs, op, rhs };

        // La recursión por la derecha produce la asociatividad derecha
        if self.accept(&Token::Keyword(Keyword::And)) {
            let rest = self.condition()?;
            Ok(Condition::And(Box::new(compare), Box::new(rest)))
        } else {
            Ok(compare)
        }
    }

    fn value(&mut self) -> Parse<Value> {
        let (location, token) = self.next()?.split();
        match token {
            Token::Number(number) => Ok(Value::Number(number)),
            Token::Boolean(boolean) => Ok(Value::Boolean(boolean)),
            Token::Id(id) => Ok(Value::Identifier(Located::at(id, location))),
            found => self.fail(ParserError::ExpectedValue(found)),
        }
    }

    fn action(&mut self) -> Parse<Action> {
        match self.next()?.into_inner() {
            Token::Keyword(Keyword::Execute) => {
                let turn_on = match self.next()?.into_inner() {
                    Token::Keyword(Keyword::TurnOn) => true,
                    Token::Keyword(Keyword::TurnOff) => false,
                    found => self.fail(ParserError::ExpectedSwitch(found))?,
                };

                self.keyword(Keyword::On)?;
                let device = self.id()?;

                if turn_on {
                    Ok(Action::TurnOn(device))
                } else {
                    Ok(Action::TurnOff(device))
                }
            }

            Token::Keyword(Keyword::Alert) => {
                self.keyword(Keyword::To)?;
                let device = self.id()?;

                self.expect(Token::Colon)?;
                let message = self.message()?;

                if self.accept(&Token::Comma) {
                    let variable = self.id()?;
                    Ok(Action::AlertWithVar {
                        device,
                        message,
                        variable,
                    })
                } else {
                    Ok(Action::Alert { device, message })
                }
            }

            Token::Keyword(Keyword::Broadcast) => {
                self.expect(Token::Colon)?;
                let message = self.message()?;

                let variable = match self.next()?.split() {
                    (_, Token::Arrow) => None,
                    (location, Token::Id(id)) => {
                        self.expect(Token::Arrow)?;
                        Some(Located::at(id, location))
                    }

                    (_, found) => self.fail(ParserError::ExpectedArrow(found))?,
                };

                self.expect(Token::OpenSquare)?;
                let devices = self.id_list()?;
                self.expect(Token::CloseSquare)?;

                match variable {
                    None => Ok(Action::Broadcast { message, devices }),
                    Some(variable) => Ok(Action::BroadcastWithVar {
                        message,
                        variable,
                        devices,
                    }),
                }
            }

            found => self.fail(ParserError::ExpectedAction(found)),
        }
    }

    fn id_list(&mut self) -> Parse<Vec<Located<Identifier>>> {
        let mut ids = vec![self.id()?];
        while self.accept(&Token::Comma) {
            ids.push(self.id()?);
        }

        Ok(ids)
    }

    fn message(&mut self) -> Parse<String> {
        match self.next()?.into_inner() {
            Token::Message(message) => Ok(message),
            found => self.fail(ParserError::ExpectedMessage(found)),
        }
    }

    fn id(&mut self) -> Parse<Located<Identifier>> {
        let (location, token) = self.next()?.split();
        match token {
            Token::Id(id) => Ok(Located::at(id, location)),
            found => self.fail(ParserError::ExpectedId(found)),
        }
    }

    fn keyword(&mut self, keyword: Keyword) -> Parse<()> {
        self.expect(Token::Keyword(keyword))
    }

    fn expect(&mut self, token: Token) -> Parse<()> {
        match self.next().map(Located::into_inner) {
            Ok(found) if found == token => Ok(()),
            Ok(found) => self.fail(ParserError::UnexpectedToken(token, found)),
            Err(_) => self.fail(ParserError::MissingToken(token)),
        }
    }

    /// Consume el siguiente token solo si es igual al esperado.
    fn accept(&mut self, token: &Token) -> bool {
        match self.tokens.next_if(|next| next.val() == token) {
            Some(accepted) => {
                self.last_known = accepted.location().clone();
                true
            }

            None => false,
        }
    }

    fn peek_is(&mut self, token: &Token) -> bool {
        self.tokens.peek().map(|next| next.val()) == Some(token)
    }

    fn next(&mut self) -> Parse<Located<Token>> {
        match self.tokens.next() {
            Some(token) => {
                self.last_known = token.location().clone();
                Ok(token.clone())
            }

            None => self.fail(ParserError::UnexpectedEof),
        }
    }

    fn fail<T>(&self, error: ParserError) -> Parse<T> {
        Err(Located::at(error, self.last_known.clone()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{lex::Lexer, source};

    fn parse_text(text: &str) -> Parse<Ast> {
        let (start, stream) = source::consume(text, "<test>");
        let tokens = Lexer::new(start.clone(), stream).try_exhaustive().unwrap();

        parse(tokens.iter(), start)
    }

    fn program(commands: &str) -> String {
        format!("dispositivos:\nlampada\nsensor[temp]\nfimdispositivos\n{}", commands)
    }

    #[test]
    fn parse_when_devices_then_observed_variables_kept() {
        let ast = parse_text(&program("execute ligar em lampada;")).unwrap();

        let devices = ast.devices();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].name().val().as_ref(), "lampada");
        assert!(devices[0].observed().is_none());
        assert_eq!(devices[1].observed().unwrap().val().as_ref(), "temp");
    }

    #[test]
    fn parse_when_commands_then_order_preserved() {
        let ast = parse_text(&program(
            "def limite = 30;\nexecute desligar em lampada;\nalerta para sensor: \"oi\", limite;",
        ))
        .unwrap();

        let commands = ast.commands();
        assert_eq!(commands.len(), 3);
        assert!(matches!(&commands[0], Command::Assign { value: Value::Number(30), .. }));
        assert!(matches!(&commands[1], Command::Action(Action::TurnOff(_))));
        assert!(matches!(
            &commands[2],
            Command::Action(Action::AlertWithVar { message, .. }) if message == "oi"
        ));
    }

    #[test]
    fn parse_when_and_chain_then_right_associative() {
        let ast = parse_text(&program(
            "quando a > 1 and b == TRUE and c != x: execute ligar em lampada;",
        ))
        .unwrap();

        let condition = match &ast.commands()[0] {
            Command::If { condition, .. } => condition,
            other => panic!("unexpected command {:?}", other),
        };

        match condition {
            Condition::And(first, rest) => {
                assert!(matches!(**first, Condition::Compare { op: CmpOp::Greater, .. }));
                match &**rest {
                    Condition::And(second, third) => {
                        assert!(matches!(
                            **second,
                            Condition::Compare { rhs: Value::Boolean(true), .. }
                        ));
                        assert!(matches!(
                            **third,
                            Condition::Compare { rhs: Value::Identifier(_), .. }
                        ));
                    }

                    other => panic!("expected nested `and`, found {:?}", other),
                }
            }

            other => panic!("expected `and`, found {:?}", other),
        }
    }

    #[test]
    fn parse_when_else_then_if_else() {
        let ast = parse_text(&program(
            "quando temp > 30: execute desligar em lampada senao execute ligar em lampada;",
        ))
        .unwrap();

        assert!(matches!(
            &ast.commands()[0],
            Command::IfElse {
                then: Action::TurnOff(_),
                otherwise: Action::TurnOn(_),
                ..
            }
        ));
    }

    #[test]
    fn parse_when_broadcast_then_devices_in_order() {
        let ast = parse_text(&program(
            "difundir: \"Alo\" -> [lampada, sensor];\ndifundir: \"T\" temp -> [sensor];",
        ))
        .unwrap();

        match &ast.commands()[0] {
            Command::Action(Action::Broadcast { message, devices }) => {
                assert_eq!(message, "Alo");
                let names: Vec<_> = devices.iter().map(|d| d.val().to_string()).collect();
                assert_eq!(names, vec!["lampada", "sensor"]);
            }

            other => panic!("unexpected command {:?}", other),
        }

        assert!(matches!(
            &ast.commands()[1],
            Command::Action(Action::BroadcastWithVar { devices, .. }) if devices.len() == 1
        ));
    }

    #[test]
    fn parse_when_missing_semicolon_then_error_names_token_and_line() {
        let error = parse_text(&program("execute ligar em lampada\nexecute ligar em sensor;"))
            .unwrap_err();

        assert!(matches!(
            error.val(),
            ParserError::UnexpectedToken(Token::Semicolon, Token::Keyword(Keyword::Execute))
        ));
        assert_eq!(error.location().start().line(), 6);
        assert_eq!(
            error.val().to_string(),
            "Expected `;`, found keyword `execute` instead"
        );
    }

    #[test]
    fn parse_when_input_ends_early_then_unexpected_eof() {
        let error = parse_text(&program("execute ligar em")).unwrap_err();

        assert!(matches!(error.val(), ParserError::UnexpectedEof));
        assert_eq!(error.location().start().line(), 5);
    }

    #[test]
    fn parse_when_no_commands_then_unexpected_eof() {
        let error = parse_text("dispositivos: lampada fimdispositivos").unwrap_err();

        assert!(matches!(error.val(), ParserError::UnexpectedEof));
    }

    #[test]
    fn parse_when_empty_input_then_missing_devices_keyword() {
        let error = parse_text("").unwrap_err();

        assert!(matches!(
            error.val(),
            ParserError::MissingToken(Token::Keyword(Keyword::Devices))
        ));
        assert_eq!(error.location().start().line(), 1);
    }

    #[test]
    fn parse_when_no_devices_then_expected_id() {
        let error = parse_text("dispositivos: fimdispositivos execute ligar em x;").unwrap_err();

        assert!(matches!(
            error.val(),
            ParserError::ExpectedId(Token::Keyword(Keyword::EndDevices))
        ));
    }

    #[test]
    fn parse_when_unknown_command_then_expected_command() {
        let error = parse_text(&program("lampada = 3;")).unwrap_err();

        assert!(matches!(error.val(), ParserError::ExpectedCommand(Token::Id(_))));
    }
}
