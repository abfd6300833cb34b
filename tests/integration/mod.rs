mod yahoo_screening_integration;
