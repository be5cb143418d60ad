use logos::{FilterResult, Logos};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Tokens do subconjunto de Pascal.
///
/// Palavras reservadas são reconhecidas sem distinção de maiúsculas e só
/// quando formam um token completo: `programa` continua sendo identificador.
#[derive(Logos, Debug, PartialEq, Clone, Serialize)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"\{[^}]*\}")]
pub enum Token {
    #[token("program", ignore(ascii_case))]
    Program,
    #[token("var", ignore(ascii_case))]
    Var,
    #[token("begin", ignore(ascii_case))]
    Begin,
    #[token("end", ignore(ascii_case))]
    End,
    #[token("function", ignore(ascii_case))]
    Function,
    #[token("forward", ignore(ascii_case))]
    Forward,
    #[token("external", ignore(ascii_case))]
    External,
    #[token("if", ignore(ascii_case))]
    If,
    #[token("then", ignore(ascii_case))]
    Then,
    #[token("else", ignore(ascii_case))]
    Else,
    #[token("while", ignore(ascii_case))]
    While,
    #[token("do", ignore(ascii_case))]
    Do,
    #[token("for", ignore(ascii_case))]
    For,
    #[token("to", ignore(ascii_case))]
    To,
    #[token("downto", ignore(ascii_case))]
    DownTo,
    #[token("array", ignore(ascii_case))]
    Array,
    #[token("of", ignore(ascii_case))]
    Of,
    #[token("div", ignore(ascii_case))]
    Div,
    #[token("mod", ignore(ascii_case))]
    Mod,
    #[token("and", ignore(ascii_case))]
    And,
    #[token("or", ignore(ascii_case))]
    Or,
    #[token("not", ignore(ascii_case))]
    Not,
    #[token("nil", ignore(ascii_case))]
    Nil,
    #[token("in", ignore(ascii_case))]
    In,

    // Tipos primitivos
    #[token("real", ignore(ascii_case))]
    TReal,
    #[token("integer", ignore(ascii_case))]
    TInteger,
    #[token("boolean", ignore(ascii_case))]
    TBoolean,
    #[token("string", ignore(ascii_case))]
    TString,
    #[token("char", ignore(ascii_case))]
    TChar,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse().ok())]
    DigitSequence(i64),

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse().ok())]
    RealNumber(f64),

    #[regex(r"'([^']|'')*'", |lex| unquote(lex.slice()))]
    CharacterString(String),

    #[token(":=")]
    Assignment,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("..")]
    DotDot,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("**")]
    StarStar,
    #[token("^")]
    UpArrow,
    #[token("=")]
    Equal,
    #[token("<>")]
    NotEqual,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("(")]
    #[token("(*", skip_paren_comment)]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
}

/// Descarta um comentário `(* ... *)`, que termina no primeiro `*)`.
fn skip_paren_comment(lex: &mut logos::Lexer<Token>) -> FilterResult<(), ()> {
    match lex.remainder().find("*)") {
        Some(end) => {
            lex.bump(end + 2);
            FilterResult::Skip
        }
        None => FilterResult::Error(()),
    }
}

/// Remove os delimitadores e desfaz o escape `''`.
fn unquote(slice: &str) -> String {
    slice[1..slice.len() - 1].replace("''", "'")
}

/// Formata um real de forma que volte a ser lido como real (`2` vira `2.0`).
pub fn format_real(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') || !value.is_finite() {
        text
    } else {
        format!("{}.0", text)
    }
}

impl Token {
    /// Nome do tipo de token, usado nas mensagens de erro de sintaxe.
    pub fn kind(&self) -> &'static str {
        match self {
            Token::Program => "PROGRAM",
            Token::Var => "VAR",
            Token::Begin => "BEGIN",
            Token::End => "END",
            Token::Function => "FUNCTION",
            Token::Forward => "FORWARD",
            Token::External => "EXTERNAL",
            Token::If => "IF",
            Token::Then => "THEN",
            Token::Else => "ELSE",
            Token::While => "WHILE",
            Token::Do => "DO",
            Token::For => "FOR",
            Token::To => "TO",
            Token::DownTo => "DOWNTO",
            Token::Array => "ARRAY",
            Token::Of => "OF",
            Token::Div => "DIV",
            Token::Mod => "MOD",
            Token::And => "AND",
            Token::Or => "OR",
            Token::Not => "NOT",
            Token::Nil => "NIL",
            Token::In => "IN",
            Token::TReal => "TREAL",
            Token::TInteger => "TINTEGER",
            Token::TBoolean => "TBOOLEAN",
            Token::TString => "TSTRING",
            Token::TChar => "TCHAR",
            Token::Identifier(_) => "IDENTIFIER",
            Token::DigitSequence(_) => "DIGSEQ",
            Token::RealNumber(_) => "REALNUMBER",
            Token::CharacterString(_) => "CHARACTER_STRING",
            Token::Assignment => "ASSIGNMENT",
            Token::Colon => "COLON",
            Token::Semicolon => "SEMICOLON",
            Token::Dot => "DOT",
            Token::Comma => "COMMA",
            Token::DotDot => "DOTDOT",
            Token::Plus => "PLUS",
            Token::Minus => "MINUS",
            Token::Star => "STAR",
            Token::Slash => "SLASH",
            Token::StarStar => "STARSTAR",
            Token::UpArrow => "UPARROW",
            Token::Equal => "EQUAL",
            Token::NotEqual => "NOTEQUAL",
            Token::Less => "LT",
            Token::Greater => "GT",
            Token::LessEqual => "LE",
            Token::GreaterEqual => "GE",
            Token::LParen => "LPAREN",
            Token::RParen => "RPAREN",
            Token::LBracket => "LBRAC",
            Token::RBracket => "RBRAC",
        }
    }
}

// Reconstrói o texto-fonte do token
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Identifier(name) => return write!(f, "{}", name),
            Token::DigitSequence(value) => return write!(f, "{}", value),
            Token::RealNumber(value) => return write!(f, "{}", format_real(*value)),
            Token::CharacterString(value) => return write!(f, "'{}'", value.replace('\'', "''")),
            Token::Program => "program",
            Token::Var => "var",
            Token::Begin => "begin",
            Token::End => "end",
            Token::Function => "function",
            Token::Forward => "forward",
            Token::External => "external",
            Token::If => "if",
            Token::Then => "then",
            Token::Else => "else",
            Token::While => "while",
            Token::Do => "do",
            Token::For => "for",
            Token::To => "to",
            Token::DownTo => "downto",
            Token::Array => "array",
            Token::Of => "of",
            Token::Div => "div",
            Token::Mod => "mod",
            Token::And => "and",
            Token::Or => "or",
            Token::Not => "not",
            Token::Nil => "nil",
            Token::In => "in",
            Token::TReal => "real",
            Token::TInteger => "integer",
            Token::TBoolean => "boolean",
            Token::TString => "string",
            Token::TChar => "char",
            Token::Assignment => ":=",
            Token::Colon => ":",
            Token::Semicolon => ";",
            Token::Dot => ".",
            Token::Comma => ",",
            Token::DotDot => "..",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::StarStar => "**",
            Token::UpArrow => "^",
            Token::Equal => "=",
            Token::NotEqual => "<>",
            Token::Less => "<",
            Token::Greater => ">",
            Token::LessEqual => "<=",
            Token::GreaterEqual => ">=",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
        };
        f.write_str(text)
    }
}

/// Caractere que nenhuma regra reconhece. Não interrompe a análise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("caractere ilegal '{character}' na linha {line}")]
pub struct LexicalError {
    pub line: usize,
    pub character: char,
}

/// Um token com a linha onde começa.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lexeme {
    pub token: Token,
    pub line: usize,
}

impl Lexeme {
    /// Formato esperado pelo parser gerado: (início, token, fim), em linhas.
    pub fn into_triple(self) -> (usize, Token, usize) {
        (self.line, self.token, self.line)
    }
}

/// Converte deslocamentos em bytes para números de linha (a partir de 1).
#[derive(Debug, Clone)]
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }
}

/// Sequência preguiçosa de tokens sobre um texto-fonte.
///
/// Erros léxicos são registrados (e logados) e o caractere ofensor é pulado;
/// a sequência continua a partir do caractere seguinte.
pub struct Lexer<'src> {
    source: &'src str,
    inner: logos::Lexer<'src, Token>,
    offset: usize,
    lines: LineIndex,
    errors: Vec<LexicalError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            inner: Token::lexer(source),
            offset: 0,
            lines: LineIndex::new(source),
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[LexicalError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<LexicalError> {
        self.errors
    }

    fn restart_at(&mut self, position: usize) {
        self.offset = position;
        self.inner = Token::lexer(&self.source[position..]);
    }
}

impl Iterator for Lexer<'_> {
    type Item = Lexeme;

    fn next(&mut self) -> Option<Lexeme> {
        loop {
            let result = self.inner.next()?;
            let span = self.inner.span();
            let start = self.offset + span.start;
            let line = self.lines.line_of(start);

            match result {
                Ok(token) => return Some(Lexeme { token, line }),
                Err(()) => {
                    let character = self.source[start..].chars().next().unwrap_or('\0');
                    tracing::warn!("caractere ilegal '{}' na linha {}", character, line);
                    self.errors.push(LexicalError { line, character });

                    // Pula exatamente um caractere, mesmo que o logos tenha consumido mais
                    let resume = start + character.len_utf8();
                    if self.offset + span.end != resume {
                        self.restart_at(resume);
                    }
                }
            }
        }
    }
}

/// Inicia a tokenização de `source`.
pub fn tokenize(source: &str) -> Lexer<'_> {
    Lexer::new(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source).map(|lexeme| lexeme.token).collect()
    }

    #[test]
    fn test_palavras_reservadas_sem_distincao_de_caixa() {
        assert_eq!(
            tokens("PROGRAM Begin eNd"),
            vec![Token::Program, Token::Begin, Token::End]
        );
    }

    #[test]
    fn test_palavra_reservada_como_prefixo_de_identificador() {
        assert_eq!(
            tokens("program programa dois downtown"),
            vec![
                Token::Program,
                Token::Identifier("programa".to_string()),
                Token::Identifier("dois".to_string()),
                Token::Identifier("downtown".to_string()),
            ]
        );
    }

    #[test]
    fn test_numeros() {
        assert_eq!(
            tokens("42 3.14 1..10"),
            vec![
                Token::DigitSequence(42),
                Token::RealNumber(3.14),
                Token::DigitSequence(1),
                Token::DotDot,
                Token::DigitSequence(10),
            ]
        );
    }

    #[test]
    fn test_operadores_compostos() {
        assert_eq!(
            tokens(":= <> <= >= .. ** : < > . *"),
            vec![
                Token::Assignment,
                Token::NotEqual,
                Token::LessEqual,
                Token::GreaterEqual,
                Token::DotDot,
                Token::StarStar,
                Token::Colon,
                Token::Less,
                Token::Greater,
                Token::Dot,
                Token::Star,
            ]
        );
    }

    #[test]
    fn test_string_com_aspas_duplicadas() {
        assert_eq!(
            tokens("'It''s ok'"),
            vec![Token::CharacterString("It's ok".to_string())]
        );
    }

    #[test]
    fn test_comentarios_descartados() {
        assert_eq!(
            tokens("x { comentario } (* outro * comentario *) y"),
            vec![
                Token::Identifier("x".to_string()),
                Token::Identifier("y".to_string()),
            ]
        );
    }

    #[test]
    fn test_comentario_com_parenteses_em_varias_linhas() {
        let lexemes: Vec<Lexeme> = tokenize("a (* um\n ** dois *) ( b )").collect();
        let tokens: Vec<&Token> = lexemes.iter().map(|l| &l.token).collect();
        assert_eq!(
            tokens,
            vec![
                &Token::Identifier("a".to_string()),
                &Token::LParen,
                &Token::Identifier("b".to_string()),
                &Token::RParen,
            ]
        );
        assert_eq!(lexemes[1].line, 2);
    }

    #[test]
    fn test_comentario_sem_fechamento() {
        let mut lexer = tokenize("x (* nunca fecha");
        let collected: Vec<Token> = lexer.by_ref().map(|l| l.token).collect();
        assert_eq!(collected[0], Token::Identifier("x".to_string()));
        assert_eq!(
            lexer.errors(),
            &[LexicalError {
                line: 1,
                character: '('
            }]
        );
        assert_eq!(lexer.errors()[0].to_string(), "caractere ilegal '(' na linha 1");
    }

    #[test]
    fn test_linhas_contadas() {
        let lexemes: Vec<Lexeme> = tokenize("a\nb\n{ x\n y }\nc").collect();
        let lines: Vec<usize> = lexemes.iter().map(|l| l.line).collect();
        assert_eq!(lines, vec![1, 2, 5]);
    }

    #[test]
    fn test_caractere_ilegal_pula_um_caractere() {
        let mut lexer = tokenize("x @ y");
        let collected: Vec<Token> = lexer.by_ref().map(|l| l.token).collect();
        assert_eq!(
            collected,
            vec![
                Token::Identifier("x".to_string()),
                Token::Identifier("y".to_string()),
            ]
        );
        assert_eq!(
            lexer.errors(),
            &[LexicalError {
                line: 1,
                character: '@'
            }]
        );
    }

    #[test]
    fn test_string_sem_fechamento() {
        let mut lexer = tokenize("'abc");
        let collected: Vec<Token> = lexer.by_ref().map(|l| l.token).collect();
        assert_eq!(collected, vec![Token::Identifier("abc".to_string())]);
        assert_eq!(lexer.into_errors().len(), 1);
    }

    #[test]
    fn test_display_reconstroi_lexema() {
        assert_eq!(Token::CharacterString("a'b".to_string()).to_string(), "'a''b'");
        assert_eq!(Token::RealNumber(2.0).to_string(), "2.0");
        assert_eq!(Token::StarStar.to_string(), "**");
        assert_eq!(Token::Semicolon.kind(), "SEMICOLON");
    }
}
