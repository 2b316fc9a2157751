use alloy::dyn_abi::{DynSolValue, JsonAbiExt, Specifier};
use alloy::json_abi::JsonAbi;
use alloy::primitives::Bytes;
use eyre::{Result, WrapErr};

/// Constructor signature string, e.g. `constructor(uint256,address)`
pub fn constructor_signature(abi: &JsonAbi) -> String {
    let params: Vec<String> = abi
        .constructor()
        .map(|c| c.inputs.iter().map(|p| p.selector_type().into_owned()).collect())
        .unwrap_or_default();
    format!("constructor({})", params.join(","))
}

/// Coerce command-line strings into constructor argument values.
///
/// Each string is parsed according to the matching constructor parameter
/// type, so `1000` becomes a `uint256` and `[1,2]` a `uint256[]`.
pub fn parse_constructor_args(abi: &JsonAbi, args: &[String]) -> Result<Vec<DynSolValue>> {
    let inputs = abi.constructor().map(|c| c.inputs.as_slice()).unwrap_or_default();

    if inputs.len() != args.len() {
        return Err(eyre::eyre!(
            "Expected {} constructor arguments for {}, got {}",
            inputs.len(),
            constructor_signature(abi),
            args.len()
        ));
    }

    inputs
        .iter()
        .zip(args)
        .map(|(param, value)| {
            let ty = param
                .resolve()
                .wrap_err_with(|| format!("Unsupported parameter type: {}", param.ty))?;
            ty.coerce_str(value).wrap_err_with(|| {
                format!("Invalid value {:?} for {} {}", value, param.ty, param.name)
            })
        })
        .collect()
}

/// Build contract creation code: bytecode followed by the encoded
/// constructor arguments.
pub fn encode_deploy_code(abi: &JsonAbi, bytecode: &Bytes, args: &[DynSolValue]) -> Result<Bytes> {
    let encoded_args = match abi.constructor() {
        Some(constructor) => constructor
            .abi_encode_input(args)
            .wrap_err("Failed to encode constructor arguments")?,
        None if args.is_empty() => Vec::new(),
        None => {
            return Err(eyre::eyre!(
                "Contract has no constructor but {} arguments were supplied",
                args.len()
            ));
        }
    };

    let mut code = bytecode.to_vec();
    code.extend_from_slice(&encoded_args);
    Ok(Bytes::from(code))
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, U256};

    use super::*;

    fn token_abi() -> JsonAbi {
        serde_json::from_str(
            r#"[
                {
                    "type": "constructor",
                    "inputs": [
                        {"name": "supply", "type": "uint256"},
                        {"name": "owner", "type": "address"}
                    ],
                    "stateMutability": "nonpayable"
                }
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_constructor_signature() {
        assert_eq!(constructor_signature(&token_abi()), "constructor(uint256,address)");
        assert_eq!(constructor_signature(&JsonAbi::default()), "constructor()");
    }

    #[test]
    fn test_parse_constructor_args() {
        let owner = "0x00000000000000000000000000000000000000ab";
        let values =
            parse_constructor_args(&token_abi(), &["1000".to_string(), owner.to_string()])
                .unwrap();

        assert_eq!(
            values,
            vec![
                DynSolValue::Uint(U256::from(1000), 256),
                DynSolValue::Address(owner.parse::<Address>().unwrap()),
            ]
        );
    }

    #[test]
    fn test_parse_constructor_args_count_mismatch() {
        let err = parse_constructor_args(&token_abi(), &["1000".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Expected 2 constructor arguments"));
    }

    #[test]
    fn test_parse_constructor_args_bad_value() {
        let args = ["lots".to_string(), "0x00000000000000000000000000000000000000ab".to_string()];
        assert!(parse_constructor_args(&token_abi(), &args).is_err());
    }

    #[test]
    fn test_encode_deploy_code_appends_args() {
        let bytecode = Bytes::from(vec![0x60, 0x01, 0x60]);
        let args = vec![
            DynSolValue::Uint(U256::from(1000), 256),
            DynSolValue::Address(Address::ZERO),
        ];

        let code = encode_deploy_code(&token_abi(), &bytecode, &args).unwrap();

        assert_eq!(code.len(), 3 + 64);
        assert_eq!(&code[..3], bytecode.as_ref());
        assert_eq!(U256::from_be_slice(&code[3..35]), U256::from(1000));
        assert!(code[35..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_encode_without_constructor() {
        let bytecode = Bytes::from(vec![0x60, 0x01]);
        let code = encode_deploy_code(&JsonAbi::default(), &bytecode, &[]).unwrap();
        assert_eq!(code, bytecode);

        let err = encode_deploy_code(&JsonAbi::default(), &bytecode, &[DynSolValue::Bool(true)]);
        assert!(err.is_err());
    }
}
