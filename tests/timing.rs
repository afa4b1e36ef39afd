mod tests {
    use bitbang_strip::timing::{
        BitTicks, ProtocolTiming, TimingError, TimingParam, Tolerance, resolve,
        resolve_with_tolerance,
    };
    use embassy_time::Duration;

    #[test]
    fn test_resolve_ws2812_at_10mhz() {
        let timing = resolve(&ProtocolTiming::WS2812, 10_000_000).unwrap();
        assert_eq!(timing.top(), 4);
        assert!((timing.tick_period_ns() - 400.0).abs() < 1e-9);
        assert_eq!(timing.bit(false), BitTicks { high: 1, total: 3 });
        assert_eq!(timing.bit(true), BitTicks { high: 2, total: 3 });
        assert_eq!(timing.reset_ticks(), 125);
    }

    #[test]
    fn test_resolve_ws2812_at_48mhz() {
        // 20.83 ns counter period, so the tick is not a whole number of ns
        let timing = resolve(&ProtocolTiming::WS2812, 48_000_000).unwrap();
        assert_eq!(timing.top(), 19);
        assert_eq!(timing.bit(false), BitTicks { high: 1, total: 3 });
        assert_eq!(timing.bit(true), BitTicks { high: 2, total: 3 });
        assert_eq!(timing.reset_ticks(), 127);
    }

    #[test]
    fn test_resolve_sk6812_rounds_reset_up() {
        let timing = resolve(&ProtocolTiming::SK6812, 10_000_000).unwrap();
        assert_eq!(timing.top(), 3);
        assert_eq!(timing.bit(false), BitTicks { high: 1, total: 4 });
        assert_eq!(timing.bit(true), BitTicks { high: 2, total: 4 });
        // 80 us / 300 ns = 266.7
        assert_eq!(timing.reset_ticks(), 267);
    }

    #[test]
    fn test_resolve_zero_frequency() {
        assert_eq!(
            resolve(&ProtocolTiming::WS2812, 0),
            Err(TimingError::ZeroFrequency)
        );
    }

    #[test]
    fn test_resolve_counter_too_slow() {
        // 1 us counter period cannot resolve a 400 ns pulse
        assert_eq!(
            resolve(&ProtocolTiming::WS2812, 1_000_000),
            Err(TimingError::Unrepresentable { shortest_ns: 400 })
        );
    }

    #[test]
    fn test_resolve_out_of_tolerance() {
        // 250 ns tick: t1l of 450 ns comes out as 250 ns
        assert_eq!(
            resolve(&ProtocolTiming::WS2812, 4_000_000),
            Err(TimingError::OutOfTolerance {
                param: TimingParam::T1l,
                required_ns: 450,
                produced_ns: 250,
            })
        );
    }

    #[test]
    fn test_resolve_with_wider_bit_tolerance() {
        let tolerance = Tolerance {
            bit_ns: 200,
            ..Tolerance::DEFAULT
        };
        let timing =
            resolve_with_tolerance(&ProtocolTiming::WS2812, 4_000_000, tolerance).unwrap();
        assert_eq!(timing.top(), 1);
        assert_eq!(timing.bit(false), BitTicks { high: 1, total: 5 });
        assert_eq!(timing.bit(true), BitTicks { high: 3, total: 5 });
    }

    #[test]
    fn test_resolve_reset_tolerance() {
        let tolerance = Tolerance {
            bit_ns: 150,
            reset_ns: 50,
        };
        assert_eq!(
            resolve_with_tolerance(&ProtocolTiming::SK6812, 10_000_000, tolerance),
            Err(TimingError::OutOfTolerance {
                param: TimingParam::Reset,
                required_ns: 80_000,
                produced_ns: 80_100,
            })
        );
    }

    #[test]
    fn test_resolved_durations_stay_within_tolerance() {
        let timings = [
            ProtocolTiming::WS2812,
            ProtocolTiming::WS2812B,
            ProtocolTiming::SK6812,
            ProtocolTiming::WS2811,
            ProtocolTiming::new(350, 700, 700, 600, 50_000),
            ProtocolTiming::new(220, 580, 580, 220, 280_000),
        ];
        let mut resolved = 0;
        for timing in &timings {
            for frequency_hz in (500_000..=80_000_000).step_by(250_000) {
                let Ok(result) = resolve(timing, frequency_hz) else {
                    continue;
                };
                resolved += 1;
                let period = result.tick_period_ns();
                for duration in [timing.t0h_ns, timing.t0l_ns, timing.t1h_ns, timing.t1l_ns] {
                    let duration = f64::from(duration);
                    let rebuilt = (duration / period).round() * period;
                    assert!(
                        (rebuilt - duration).abs() <= 150.0,
                        "{duration} ns at {frequency_hz} Hz rebuilt as {rebuilt} ns"
                    );
                }
                let reset = f64::from(result.reset_ticks()) * period;
                assert!(
                    reset >= f64::from(timing.reset_ns) - 1e-6,
                    "reset of {} ns at {frequency_hz} Hz produced {reset} ns",
                    timing.reset_ns
                );
            }
        }
        assert!(resolved > 0);
    }

    #[test]
    fn test_resolve_reset_exact_multiple_at_13mhz() {
        // 130 ticks of 5/13 us is exactly 50 us
        let timing = resolve(&ProtocolTiming::WS2812, 13_000_000).unwrap();
        assert_eq!(timing.top(), 5);
        assert_eq!(timing.reset_ticks(), 130);
    }

    #[test]
    fn test_resolve_ws2811_at_5mhz() {
        let timing = resolve(&ProtocolTiming::WS2811, 5_000_000).unwrap();
        assert_eq!(timing.top(), 2);
        assert_eq!(timing.bit(false), BitTicks { high: 1, total: 6 });
        assert_eq!(timing.bit(true), BitTicks { high: 3, total: 6 });
        assert_eq!(timing.reset_ticks(), 125);
    }

    #[test]
    fn test_resolve_ws2811_needs_slow_counter() {
        assert_eq!(
            resolve(&ProtocolTiming::WS2811, 10_000_000),
            Err(TimingError::OutOfTolerance {
                param: TimingParam::T1h,
                required_ns: 1_200,
                produced_ns: 1_000,
            })
        );
    }

    #[test]
    fn test_frame_duration() {
        let timing = resolve(&ProtocolTiming::WS2812, 10_000_000).unwrap();
        let bytes = [0x00, 0xff, 0x0f];
        assert_eq!(timing.frame_ticks(&bytes), 24 * 3 + 125);
        // 197 ticks * 400 ns = 78.8 us
        assert_eq!(timing.frame_duration(&bytes), Duration::from_micros(79));
    }
}
