//! Used for viewing assembly of every engine via `cargo-show-asm`.

use lanecrypt::aes::modes::Ctr;
use lanecrypt::chacha::{Lanes, State};
use lanecrypt::*;
use core::hint::black_box;

fn main() {
    let key = [0; 32];
    let nonce = [0; 12];
    let mut buf = [0; 4096];

    for lanes in PolyLanes::ALL {
        let mut mac = Poly1305::with_lanes(black_box(&key), lanes);
        mac.update(black_box(&buf));
        black_box(mac.finalize());
    }
    for width in SimdWidth::ALL {
        let mut ghash = GHash::with_width(black_box(&[0; BLOCK_LEN]), width);
        ghash.update(black_box(&buf));
        black_box(ghash.finalize());

        let keys = RoundKeys::expand(black_box(&key)).unwrap();
        let mut gcm = AesGcm::with_width(keys, width);
        black_box(gcm.seal_in_place(&nonce, &[], &mut buf).unwrap());
    }
    for lanes in AesLanes::ALL {
        let keys = RoundKeys::expand(black_box(&key)).unwrap();
        let mut ctr = Ctr::with_lanes(keys.clone(), lanes, &[0; BLOCK_LEN]);
        ctr.apply_keystream(&mut buf);
        Aes::with_lanes(keys, lanes)
            .encrypt_blocks(&mut buf)
            .unwrap();
    }
    for lanes in Lanes::ALL {
        let mut chacha = ChaCha20::with_lanes(State::new(black_box(&key), &nonce, 0), lanes);
        chacha.apply_keystream(&mut buf).unwrap();
    }
    black_box(buf);
}
