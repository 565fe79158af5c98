// Property-based tests for cold-start configuration resolution

use proptest::prelude::*;
use secrecy::ExposeSecret;
use shared::{Config, ConfigurationError, ConnectionSource, EnvSnapshot, RuntimeMode};

// ============================================================================
// Property Generators
// ============================================================================

fn arb_host() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9]{0,10}(\\.[a-z][a-z0-9]{0,10}){0,3}",
        (1u8..=254, 0u8..=255, 0u8..=255, 1u8..=254).prop_map(|(a, b, c, d)| format!("{a}.{b}.{c}.{d}")),
    ]
}

fn arb_ident() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,15}"
}

/// Passwords including characters that must be percent-encoded in a URL.
fn arb_password() -> impl Strategy<Value = String> {
    "[A-Za-z0-9@:/?#%!]{1,20}"
}

fn arb_sslmode() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["disable", "allow", "prefer", "require", "verify-ca", "verify-full"])
}

const FIELDS: [&str; 4] = ["DB_HOST", "DB_NAME", "DB_USER", "DB_PASSWORD"];

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn well_formed_url_round_trips_components(
        host in arb_host(),
        port in 1u16..,
        database in arb_ident(),
        user in arb_ident(),
        password in arb_password(),
        sslmode in arb_sslmode(),
    ) {
        let url = format!(
            "postgresql://{}:{}@{}:{}/{}?sslmode={}",
            urlencoding::encode(&user),
            urlencoding::encode(&password),
            host,
            port,
            database,
            sslmode
        );
        let env = EnvSnapshot::from_pairs([("USE_POSTGRES", "true".to_string()), ("DATABASE_URL", url)]);

        let config = Config::resolve(&env).unwrap();
        let pg = config.persistence.postgres().unwrap();
        prop_assert_eq!(pg.host(), host.as_str());
        prop_assert_eq!(pg.port(), port);
        prop_assert_eq!(pg.database(), database.as_str());
        prop_assert_eq!(pg.user(), user.as_str());
        prop_assert_eq!(pg.password().expose_secret(), password.as_str());
        prop_assert_eq!(pg.ssl_mode().as_str(), sslmode);
        prop_assert_eq!(pg.source(), ConnectionSource::Url);
    }

    #[test]
    fn complete_fields_resolve_with_default_port(
        host in arb_host(),
        database in arb_ident(),
        user in arb_ident(),
        password in arb_password(),
        port in proptest::option::of(1u16..),
    ) {
        let mut pairs = vec![
            ("USE_POSTGRES", "true".to_string()),
            ("DB_HOST", host.clone()),
            ("DB_NAME", database.clone()),
            ("DB_USER", user.clone()),
            ("DB_PASSWORD", password.clone()),
        ];
        if let Some(port) = port {
            pairs.push(("DB_PORT", port.to_string()));
        }

        let config = Config::resolve(&EnvSnapshot::from_pairs(pairs)).unwrap();
        let pg = config.persistence.postgres().unwrap();
        prop_assert_eq!(pg.host(), host.as_str());
        prop_assert_eq!(pg.database(), database.as_str());
        prop_assert_eq!(pg.user(), user.as_str());
        prop_assert_eq!(pg.port(), port.unwrap_or(5432));
        prop_assert_eq!(pg.source(), ConnectionSource::Fields);
    }

    #[test]
    fn incomplete_fields_fail_naming_the_gaps(
        present in proptest::collection::vec(any::<bool>(), 4),
        blank_instead_of_absent in any::<bool>(),
    ) {
        prop_assume!(present.iter().any(|p| !p));

        let mut pairs = vec![("USE_POSTGRES", "true".to_string())];
        let mut expected_missing = Vec::new();
        for (name, is_present) in FIELDS.iter().zip(&present) {
            if *is_present {
                pairs.push((*name, "value".to_string()));
            } else {
                expected_missing.push(*name);
                if blank_instead_of_absent {
                    pairs.push((*name, String::new()));
                }
            }
        }

        let err = Config::resolve(&EnvSnapshot::from_pairs(pairs)).unwrap_err();
        prop_assert_eq!(err, ConfigurationError::MissingVariables { missing: expected_missing });
    }

    #[test]
    fn only_production_token_selects_production(value in "\\PC{0,12}") {
        let env = EnvSnapshot::from_pairs([("FLASK_ENV", value.clone())]);
        let expected = if value.trim().eq_ignore_ascii_case("production") {
            RuntimeMode::Production
        } else {
            RuntimeMode::Development
        };
        prop_assert_eq!(RuntimeMode::resolve(&env), expected);
    }

    #[test]
    fn resolution_is_idempotent(
        host in arb_host(),
        database in arb_ident(),
        use_url in any::<bool>(),
        production in any::<bool>(),
    ) {
        let mut pairs = vec![("USE_POSTGRES", "true".to_string())];
        if production {
            pairs.push(("FLASK_ENV", "production".to_string()));
        }
        if use_url {
            pairs.push(("DATABASE_URL", format!("postgresql://u:p@{host}:5432/{database}?sslmode=require")));
        } else {
            pairs.extend([
                ("DB_HOST", host),
                ("DB_NAME", database),
                ("DB_USER", "u".to_string()),
                ("DB_PASSWORD", "p".to_string()),
            ]);
        }
        let env = EnvSnapshot::from_pairs(pairs);
        prop_assert_eq!(Config::resolve(&env).unwrap(), Config::resolve(&env).unwrap());
    }
}

#[test]
fn use_postgres_alone_is_a_configuration_error() {
    let env = EnvSnapshot::from_pairs([("USE_POSTGRES", "true")]);
    assert!(matches!(
        Config::resolve(&env),
        Err(ConfigurationError::MissingVariables { .. })
    ));
}
