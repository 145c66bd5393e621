//! Every batch width has to produce exactly what the one-block path produces, however the
//! input is split across calls.

use lanecrypt::aes::modes::{Cbc, Ctr};
use lanecrypt::chacha::{Lanes, State};
use lanecrypt::*;
use proptest::prelude::*;

fn bytes(max: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..max)
}

fn aes_key() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 16),
        prop::collection::vec(any::<u8>(), 24),
        prop::collection::vec(any::<u8>(), 32),
    ]
}

proptest! {
    #[test]
    fn poly1305_lanes_agree(key in any::<[u8; 32]>(), data in bytes(1500), split in any::<usize>()) {
        let split = split % (data.len() + 1);
        let expected = poly1305::mac(&key, &data);
        for lanes in PolyLanes::ALL {
            let mut mac = Poly1305::with_lanes(&key, lanes);
            mac.update(&data[..split]);
            mac.update(&data[split..]);
            prop_assert_eq!(mac.finalize(), expected, "{:?}", lanes);
        }
    }

    #[test]
    fn ghash_widths_agree(h in any::<[u8; 16]>(), data in bytes(2000), split in any::<usize>()) {
        let split = split % (data.len() + 1);
        let mut one = GHash::with_width(&h, SimdWidth::Scalar);
        one.update(&data);
        let expected = one.finalize();
        for width in SimdWidth::ALL {
            let mut ghash = GHash::with_width(&h, width);
            ghash.update(&data[..split]);
            ghash.update(&data[split..]);
            prop_assert_eq!(ghash.finalize(), expected, "{}", width);
        }
    }

    #[test]
    fn ecb_lanes_agree(key in aes_key(), blocks in 0..80usize, seed in any::<u8>()) {
        let keys = RoundKeys::expand(&key).unwrap();
        let data: Vec<u8> = (0..blocks * BLOCK_LEN).map(|i| (i as u8) ^ seed).collect();
        let mut expected = data.clone();
        Aes::with_lanes(keys.clone(), AesLanes::One).encrypt_blocks(&mut expected).unwrap();
        for lanes in AesLanes::ALL {
            let aes = Aes::with_lanes(keys.clone(), lanes);
            let mut buf = data.clone();
            aes.encrypt_blocks(&mut buf).unwrap();
            prop_assert_eq!(&buf, &expected, "{:?}", lanes);
            aes.decrypt_blocks(&mut buf).unwrap();
            prop_assert_eq!(&buf, &data, "{:?}", lanes);
        }
    }

    #[test]
    fn ctr_lanes_agree(
        key in aes_key(),
        counter in any::<[u8; 16]>(),
        data in bytes(1500),
        split in any::<usize>(),
    ) {
        let split = split % (data.len() + 1);
        let keys = RoundKeys::expand(&key).unwrap();
        let mut expected = data.clone();
        Ctr::with_lanes(keys.clone(), AesLanes::One, &counter).apply_keystream(&mut expected);
        for lanes in AesLanes::ALL {
            let mut ctr = Ctr::with_lanes(keys.clone(), lanes, &counter);
            let mut buf = data.clone();
            let (head, tail) = buf.split_at_mut(split);
            ctr.apply_keystream(head);
            ctr.apply_keystream(tail);
            prop_assert_eq!(&buf, &expected, "{:?}", lanes);
        }
    }

    #[test]
    fn cbc_round_trips(key in aes_key(), iv in any::<[u8; 16]>(), blocks in 0..70usize) {
        let keys = RoundKeys::expand(&key).unwrap();
        let data: Vec<u8> = (0..blocks * BLOCK_LEN).map(|i| (i * 7) as u8).collect();
        let mut ciphertext = data.clone();
        Cbc::with_lanes(keys.clone(), AesLanes::One, &iv).encrypt(&mut ciphertext).unwrap();
        for lanes in AesLanes::ALL {
            let mut buf = ciphertext.clone();
            Cbc::with_lanes(keys.clone(), lanes, &iv).decrypt(&mut buf).unwrap();
            prop_assert_eq!(&buf, &data, "{:?}", lanes);
        }
    }

    #[test]
    fn gcm_widths_agree(
        key in aes_key(),
        nonce in any::<[u8; 12]>(),
        aad in bytes(100),
        data in bytes(3000),
        flip in any::<usize>(),
    ) {
        let keys = RoundKeys::expand(&key).unwrap();
        let mut expected = data.clone();
        let expected_tag = AesGcm::with_width(keys.clone(), SimdWidth::Scalar)
            .seal_in_place(&nonce, &aad, &mut expected)
            .unwrap();
        for width in SimdWidth::ALL {
            let mut gcm = AesGcm::with_width(keys.clone(), width);
            let mut buf = data.clone();
            let tag = gcm.seal_in_place(&nonce, &aad, &mut buf).unwrap();
            prop_assert_eq!(&buf, &expected, "{}", width);
            prop_assert_eq!(tag, expected_tag, "{}", width);

            if !buf.is_empty() {
                let mut tampered = buf.clone();
                tampered[flip % buf.len()] ^= 1;
                prop_assert_eq!(
                    gcm.open_in_place(&nonce, &aad, &mut tampered, &tag),
                    Err(Error::AuthenticationFailed)
                );
            }
            gcm.open_in_place(&nonce, &aad, &mut buf, &tag).unwrap();
            prop_assert_eq!(&buf, &data, "{}", width);
        }
    }

    #[test]
    fn chacha_lanes_agree(
        key in any::<[u8; 32]>(),
        nonce in any::<[u8; 12]>(),
        counter in 0..u32::MAX / 2,
        data in bytes(2000),
        split in any::<usize>(),
    ) {
        let split = split % (data.len() + 1);
        let mut expected = data.clone();
        ChaCha20::with_lanes(State::new(&key, &nonce, counter), Lanes::One)
            .apply_keystream(&mut expected)
            .unwrap();
        for lanes in Lanes::ALL {
            let mut chacha = ChaCha20::with_lanes(State::new(&key, &nonce, counter), lanes);
            let mut buf = data.clone();
            let (head, tail) = buf.split_at_mut(split);
            chacha.apply_keystream(head).unwrap();
            chacha.apply_keystream(tail).unwrap();
            prop_assert_eq!(&buf, &expected, "{:?}", lanes);
        }
    }
}
