//! Propriedades do analisador léxico.
//!
//! - Reimprimir uma sequência de tokens e tokenizar de novo devolve os mesmos tokens
//! - Palavras reservadas não dependem de maiúsculas
//! - O número de linha nunca diminui ao longo da sequência

use compilador_pascal::lexer::{tokenize, Token};
use proptest::prelude::*;

fn arb_token() -> impl Strategy<Value = Token> {
    prop_oneof![
        Just(Token::Program),
        Just(Token::Begin),
        Just(Token::End),
        Just(Token::DownTo),
        Just(Token::Div),
        Just(Token::TInteger),
        Just(Token::Assignment),
        Just(Token::Colon),
        Just(Token::DotDot),
        Just(Token::Dot),
        Just(Token::StarStar),
        Just(Token::Star),
        Just(Token::LessEqual),
        Just(Token::NotEqual),
        Just(Token::Less),
        Just(Token::LBracket),
        Just(Token::RParen),
        "[a-z_][a-z0-9_]{0,8}"
            .prop_filter("não pode ser palavra reservada", |s| is_identifier(s))
            .prop_map(Token::Identifier),
        (0i64..1_000_000).prop_map(Token::DigitSequence),
        (0u32..10_000, 1u32..100).prop_map(|(i, f)| Token::RealNumber(format!("{}.{}", i, f).parse().unwrap())),
        "[a-z ']{0,10}".prop_map(Token::CharacterString),
    ]
}

fn is_identifier(text: &str) -> bool {
    matches!(tokenize(text).map(|l| l.token).collect::<Vec<_>>().as_slice(), [Token::Identifier(_)])
}

fn render(tokens: &[Token], separator: &str) -> String {
    tokens.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(separator)
}

proptest! {
    #[test]
    fn prop_reimprimir_e_tokenizar_preserva_tokens(tokens in prop::collection::vec(arb_token(), 0..40)) {
        let source = render(&tokens, " ");
        let relexed: Vec<Token> = tokenize(&source).map(|l| l.token).collect();
        prop_assert_eq!(relexed, tokens);
    }

    #[test]
    fn prop_linhas_nao_diminuem(tokens in prop::collection::vec(arb_token(), 1..30)) {
        let source = render(&tokens, "\n");
        let lines: Vec<usize> = tokenize(&source).map(|l| l.line).collect();
        prop_assert!(lines.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(lines.last().copied(), Some(tokens.len()));
    }

    #[test]
    fn prop_palavras_reservadas_sem_caixa(upper in prop::collection::vec(any::<bool>(), 6)) {
        let word: String = "downto"
            .chars()
            .zip(upper)
            .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
            .collect();
        let tokens: Vec<Token> = tokenize(&word).map(|l| l.token).collect();
        prop_assert_eq!(tokens, vec![Token::DownTo]);
    }
}
